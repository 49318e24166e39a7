use indexmap::IndexMap ;
use tracing::debug ;

use super::TargetOs ;



/// Name of the remap manifest at the root of a native archive.
pub const REMAP_MANIFEST: &str = "remap.xml" ;

/// An OS-scoped mapping from a logical library name to the library that provides it.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub struct RemapRule {
    pub source: String,
    pub os: TargetOs,
    pub target: String,
}

impl RemapRule {

    fn from_node( node: roxmltree::Node<'_, '_> ) -> Option<Self> {
        let attribute = | name: &str | node.attribute( name ).map( str::trim ).filter(| value | !value.is_empty() );
        let rule = Self {
            source: attribute( "dll" )?.to_owned(),
            os: TargetOs::parse( attribute( "os" )? )?,
            target: attribute( "target" )?.to_owned(),
        };
        Some( rule )
    }

}

/// Parses a remap manifest:
///
/// ```xml
/// <configuration>
///   <dllmap dll="codec" os="linux" target="libcodec.so.2"/>
/// </configuration>
/// ```
///
/// Elements with a missing or blank attribute or an unknown OS are skipped. A document
/// whose root is not `configuration` has no rules.
///
/// # Errors
/// Fails when the document is not well-formed XML.
pub fn parse_remap( xml: &str ) -> Result<Vec<RemapRule>, roxmltree::Error> {
    let document = roxmltree::Document::parse( xml )?;
    let root = document.root_element();
    if !root.has_tag_name( "configuration" ) {
        debug!( "Ignoring remap manifest with root <{}>", root.tag_name().name() );
        return Ok( Vec::new() )
    }
    Ok( root.children()
        .filter(| node | node.has_tag_name( "dllmap" ))
        .filter_map(| node | {
            let rule = RemapRule::from_node( node );
            if rule.is_none() { debug!( "Skipping incomplete dllmap entry" ); }
            rule
        })
        .collect() )
}

/// The links to create on `os`, as `source -> target`. A later rule for the same source
/// replaces an earlier one.
pub fn links_for( rules: &[RemapRule], os: TargetOs ) -> IndexMap<String, String> {
    rules.iter()
        .filter(| rule | rule.os == os )
        .map(| rule | ( rule.source.clone(), rule.target.clone() ))
        .collect()
}

#[cfg( test )]
mod tests {

    use super::* ;

    const MANIFEST: &str = r#"<?xml version="1.0"?>
        <configuration>
            <dllmap dll="codec" os="Linux" target="libcodec.so.2"/>
            <dllmap dll="codec" os="win64" target="codec64.dll"/>
            <dllmap dll="blank" os="linux" target="  "/>
            <dllmap dll="exotic" os="beos" target="libexotic.so"/>
            <dllmap os="linux" target="libnameless.so"/>
            <other dll="ignored" os="linux" target="ignored"/>
            <dllmap dll="codec" os="unix" target="libcodec.so.3"/>
        </configuration>"#;

    #[test]
    fn manifest_keeps_only_complete_rules() {
        let rules = parse_remap( MANIFEST ).unwrap();
        assert_eq!( rules, vec![
            RemapRule { source: "codec".to_owned(), os: TargetOs::Linux, target: "libcodec.so.2".to_owned() },
            RemapRule { source: "codec".to_owned(), os: TargetOs::Windows, target: "codec64.dll".to_owned() },
            RemapRule { source: "codec".to_owned(), os: TargetOs::Linux, target: "libcodec.so.3".to_owned() },
        ]);
    }

    #[test]
    fn links_are_filtered_by_os_and_last_rule_wins() {
        let rules = parse_remap( MANIFEST ).unwrap();
        let links = links_for( &rules, TargetOs::Linux );
        assert_eq!( links.len(), 1 );
        assert_eq!( links.get( "codec" ).map( String::as_str ), Some( "libcodec.so.3" ));
        assert!( links_for( &rules, TargetOs::MacOs ).is_empty() );
    }

    #[test]
    fn foreign_roots_and_broken_documents() {
        assert_eq!( parse_remap( "<dllmaps><dllmap dll='a' os='linux' target='b'/></dllmaps>" ).unwrap(), Vec::new() );
        assert!( parse_remap( "<configuration><dllmap" ).is_err() );
    }

}
