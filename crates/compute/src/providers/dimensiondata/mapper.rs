//! Conversion of response elements into typed entities.
//!
//! Mappers that embed a location take the full location listing and
//! resolve the element's datacenter id against it.

use std::str::FromStr;

use tracing::warn;

use super::models::{Network, NetworkDomain, Vlan, NETWORK_NS, SERVER_NS, TYPES_URN};
use crate::providers::traits::{
    ComputeError, ImageExtra, Node, NodeExtra, NodeImage, NodeLocation, NodeState, Status,
};
use crate::xml::Element;

// ============================================================================
// Location resolution
// ============================================================================

/// Find the location with exactly this id.
///
/// # Errors
/// Returns [`ComputeError::NotFound`] when no location matches. Duplicate
/// ids resolve to the first match.
pub fn resolve_location<'a>(
    location_id: &str,
    locations: &'a [NodeLocation],
) -> Result<&'a NodeLocation, ComputeError> {
    let mut matches = locations.iter().filter(|location| location.id == location_id);

    let location = matches
        .next()
        .ok_or_else(|| ComputeError::NotFound(format!("location {location_id}")))?;

    if matches.next().is_some() {
        warn!(location_id = %location_id, "Location id listed more than once, using first");
    }

    Ok(location)
}

// ============================================================================
// Helpers
// ============================================================================

fn text(element: &Element, path: &str, ns: &str) -> Option<String> {
    element.findtext(path, ns).map(str::to_string)
}

fn required_attr<'a>(element: &'a Element, name: &str) -> Result<&'a str, ComputeError> {
    element.attr(name).ok_or_else(|| {
        ComputeError::MalformedResponse(format!("<{}> has no '{name}' attribute", element.name()))
    })
}

fn required_text<'a>(element: &'a Element, path: &str, ns: &str) -> Result<&'a str, ComputeError> {
    element.findtext(path, ns).ok_or_else(|| {
        ComputeError::MalformedResponse(format!("<{}> has no <{path}>", element.name()))
    })
}

fn number<T: FromStr>(element: &Element, path: &str, ns: &str) -> Result<Option<T>, ComputeError> {
    element
        .findtext(path, ns)
        .map(|value| {
            value.trim().parse::<T>().map_err(|_| {
                ComputeError::MalformedResponse(format!(
                    "<{path}> of <{}> is not a number: '{value}'",
                    element.name()
                ))
            })
        })
        .transpose()
}

// ============================================================================
// Status
// ============================================================================

/// Map an optional progress element; absence yields an empty status.
///
/// Children are read in the status element's own namespace.
#[must_use]
pub fn to_status(element: Option<&Element>) -> Status {
    let Some(element) = element else {
        return Status::default();
    };
    let ns = element.namespace().unwrap_or("");

    Status {
        action: text(element, "action", ns),
        request_time: text(element, "requestTime", ns),
        user_name: text(element, "userName", ns),
        number_of_steps: text(element, "numberOfSteps", ns),
        step_name: text(element, "step/name", ns),
        step_number: text(element, "step/number", ns),
        step_percent_complete: text(element, "step/percentComplete", ns),
        failure_reason: text(element, "failureReason", ns),
    }
}

// ============================================================================
// Locations
// ============================================================================

/// Map every `datacenter` element of a listing.
///
/// # Errors
/// Returns error if any datacenter lacks an id.
pub fn to_locations(doc: &Element) -> Result<Vec<NodeLocation>, ComputeError> {
    doc.findall("datacenter", TYPES_URN)
        .into_iter()
        .map(to_location)
        .collect()
}

/// Map one `datacenter` element.
///
/// # Errors
/// Returns error if the element has no id.
pub fn to_location(element: &Element) -> Result<NodeLocation, ComputeError> {
    Ok(NodeLocation {
        id: required_attr(element, "id")?.to_string(),
        name: text(element, "displayName", TYPES_URN).unwrap_or_default(),
        country: text(element, "country", TYPES_URN).unwrap_or_default(),
    })
}

// ============================================================================
// Nodes
// ============================================================================

/// Map every `Server` element of a listing.
///
/// # Errors
/// Returns error if any server element is malformed.
pub fn to_nodes(doc: &Element) -> Result<Vec<Node>, ComputeError> {
    doc.findall("Server", TYPES_URN)
        .into_iter()
        .map(to_node)
        .collect()
}

/// Map one server element.
///
/// # Errors
/// Returns error if the id is missing or a numeric field does not parse.
pub fn to_node(element: &Element) -> Result<Node, ComputeError> {
    let state = NodeState::from_started(element.findtext("started", TYPES_URN) == Some("true"));
    let status = to_status(element.find("progress", TYPES_URN));

    let network_info = element.find("networkInfo", TYPES_URN);
    let operating_system = element.find("operatingSystem", TYPES_URN);
    let os_attr = |name: &str| {
        operating_system
            .and_then(|os| os.attr(name))
            .map(str::to_string)
    };

    let extra = NodeExtra {
        description: text(element, "description", TYPES_URN),
        source_image_id: text(element, "sourceImageId", TYPES_URN),
        network_id: text(element, "networkId", TYPES_URN),
        network_domain_id: network_info
            .and_then(|info| info.attr("networkDomainId"))
            .map(str::to_string),
        datacenter_id: element.attr("datacenterId").map(str::to_string),
        deployed_time: text(element, "createTime", TYPES_URN),
        cpu_count: number(element, "cpuCount", TYPES_URN)?,
        memory_mb: number::<u64>(element, "memoryGb", TYPES_URN)?
            .map(|gb| {
                gb.checked_mul(1024).ok_or_else(|| {
                    ComputeError::MalformedResponse(format!("<memoryGb> out of range: {gb}"))
                })
            })
            .transpose()?,
        os_id: os_attr("id"),
        os_type: os_attr("family"),
        os_display_name: os_attr("displayName"),
        status,
        password: None,
    };

    let public_ips = text(element, "publicIpAddress", TYPES_URN)
        .into_iter()
        .collect();

    // Domain-attached servers report the primary NIC under networkInfo,
    // legacy servers a single top-level nic.
    let nic = match network_info {
        Some(info) => info.find("primaryNic", TYPES_URN),
        None => element.find("nic", TYPES_URN),
    };
    let private_ips = nic
        .and_then(|nic| nic.attr("privateIpv4"))
        .map(str::to_string)
        .into_iter()
        .collect();

    Ok(Node {
        id: required_attr(element, "id")?.to_string(),
        name: text(element, "name", TYPES_URN).unwrap_or_default(),
        state,
        public_ips,
        private_ips,
        extra,
    })
}

// ============================================================================
// Images
// ============================================================================

/// Map every base `image` element of a listing.
///
/// # Errors
/// Returns error if any image is malformed or placed in an unknown location.
pub fn to_base_images(
    doc: &Element,
    locations: &[NodeLocation],
) -> Result<Vec<NodeImage>, ComputeError> {
    doc.findall("image", SERVER_NS)
        .into_iter()
        .map(|element| to_base_image(element, locations))
        .collect()
}

/// Map one base image element.
///
/// Customer images are shaped differently and are not handled here.
///
/// # Errors
/// Returns error if the id or location is missing or unknown.
pub fn to_base_image(
    element: &Element,
    locations: &[NodeLocation],
) -> Result<NodeImage, ComputeError> {
    let location = resolve_location(required_attr(element, "location")?, locations)?;

    let extra = ImageExtra {
        description: text(element, "description", SERVER_NS),
        os_type: text(element, "operatingSystem/type", SERVER_NS),
        os_display_name: text(element, "operatingSystem/displayName", SERVER_NS),
        cpu_count: number(element, "cpuCount", SERVER_NS)?,
        resource_path: text(element, "resourcePath", SERVER_NS),
        memory: number(element, "memory", SERVER_NS)?,
        os_storage: number(element, "osStorage", SERVER_NS)?,
        additional_storage: number(element, "additionalStorage", SERVER_NS)?,
        created: text(element, "created", SERVER_NS),
        location: location.clone(),
    };

    Ok(NodeImage {
        id: required_attr(element, "id")?.to_string(),
        name: text(element, "name", SERVER_NS).unwrap_or_default(),
        extra,
    })
}

// ============================================================================
// Networks
// ============================================================================

/// Map every legacy `network` element of a listing.
///
/// # Errors
/// Returns error if any network is malformed or placed in an unknown location.
pub fn to_networks(doc: &Element, locations: &[NodeLocation]) -> Result<Vec<Network>, ComputeError> {
    doc.findall("network", NETWORK_NS)
        .into_iter()
        .map(|element| to_network(element, locations))
        .collect()
}

/// Map one legacy network element.
///
/// # Errors
/// Returns error if the id or location is missing or unknown.
pub fn to_network(element: &Element, locations: &[NodeLocation]) -> Result<Network, ComputeError> {
    let location = resolve_location(required_text(element, "location", NETWORK_NS)?, locations)?;

    Ok(Network {
        id: required_text(element, "id", NETWORK_NS)?.to_string(),
        name: text(element, "name", NETWORK_NS).unwrap_or_default(),
        description: text(element, "description", NETWORK_NS),
        location: location.clone(),
        private_net: text(element, "privateNet", NETWORK_NS),
        multicast: element.findtext("multicast", NETWORK_NS) == Some("true"),
        status: to_status(element.find("status", NETWORK_NS)),
    })
}

/// Map every `networkDomain` element of a listing.
///
/// # Errors
/// Returns error if any domain is malformed or placed in an unknown location.
pub fn to_network_domains(
    doc: &Element,
    locations: &[NodeLocation],
) -> Result<Vec<NetworkDomain>, ComputeError> {
    doc.findall("networkDomain", TYPES_URN)
        .into_iter()
        .map(|element| to_network_domain(element, locations))
        .collect()
}

/// Map one network domain element.
///
/// # Errors
/// Returns error if the id or datacenter is missing or unknown.
pub fn to_network_domain(
    element: &Element,
    locations: &[NodeLocation],
) -> Result<NetworkDomain, ComputeError> {
    let location = resolve_location(required_attr(element, "datacenterId")?, locations)?;

    Ok(NetworkDomain {
        id: required_attr(element, "id")?.to_string(),
        name: text(element, "name", TYPES_URN).unwrap_or_default(),
        description: text(element, "description", TYPES_URN),
        location: location.clone(),
        status: to_status(element.find("state", TYPES_URN)),
    })
}

/// Map every `vlan` element of a listing.
///
/// # Errors
/// Returns error if any VLAN is malformed or placed in an unknown location.
pub fn to_vlans(doc: &Element, locations: &[NodeLocation]) -> Result<Vec<Vlan>, ComputeError> {
    doc.findall("vlan", TYPES_URN)
        .into_iter()
        .map(|element| to_vlan(element, locations))
        .collect()
}

/// Map one VLAN element.
///
/// # Errors
/// Returns error if the id or datacenter is missing or unknown.
pub fn to_vlan(element: &Element, locations: &[NodeLocation]) -> Result<Vlan, ComputeError> {
    let location = resolve_location(required_attr(element, "datacenterId")?, locations)?;

    Ok(Vlan {
        id: required_attr(element, "id")?.to_string(),
        name: text(element, "name", TYPES_URN).unwrap_or_default(),
        description: text(element, "description", TYPES_URN),
        location: location.clone(),
        network_domain_id: element
            .find("networkDomain", TYPES_URN)
            .and_then(|domain| domain.attr("id"))
            .map(str::to_string),
        status: to_status(element.find("state", TYPES_URN)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations() -> Vec<NodeLocation> {
        vec![
            NodeLocation {
                id: "NA9".to_string(),
                name: "US - East 3".to_string(),
                country: "US".to_string(),
            },
            NodeLocation {
                id: "EU6".to_string(),
                name: "Europe 6".to_string(),
                country: "DE".to_string(),
            },
        ]
    }

    fn server(body: &str) -> Element {
        Element::parse(&format!(
            r#"<server xmlns="urn:didata.com:api:cloud:types" id="SRV1" datacenterId="NA9">{body}</server>"#
        ))
        .unwrap()
    }

    const NODE_WITH_NETWORK_INFO: &str = r#"
        <name>web1</name>
        <description>front end</description>
        <operatingSystem id="UBUNTU1264" displayName="UBUNTU12/64" family="UNIX"/>
        <cpuCount>2</cpuCount>
        <memoryGb>4</memoryGb>
        <networkInfo networkDomainId="ND1">
            <primaryNic id="NIC1" privateIpv4="10.0.0.8" vlanId="VLAN1"/>
        </networkInfo>
        <nic privateIpv4="192.168.9.9"/>
        <publicIpAddress>165.180.1.2</publicIpAddress>
        <sourceImageId>IMG1</sourceImageId>
        <createTime>2015-09-24T14:26:01.000Z</createTime>
        <started>true</started>
    "#;

    #[test]
    fn test_resolve_location() {
        let locations = locations();
        assert_eq!(resolve_location("EU6", &locations).unwrap().country, "DE");

        let err = resolve_location("AP1", &locations).unwrap_err();
        assert!(matches!(err, ComputeError::NotFound(ref what) if what.contains("AP1")));
    }

    #[test]
    fn test_resolve_location_duplicates_take_first() {
        let mut locations = locations();
        let mut duplicate = locations[0].clone();
        duplicate.name = "shadow".to_string();
        locations.push(duplicate);

        assert_eq!(resolve_location("NA9", &locations).unwrap().name, "US - East 3");
    }

    #[test]
    fn test_node_with_network_info() {
        let node = to_node(&server(NODE_WITH_NETWORK_INFO)).unwrap();

        assert_eq!(node.id, "SRV1");
        assert_eq!(node.name, "web1");
        assert_eq!(node.state, NodeState::Running);
        assert_eq!(node.private_ips, vec!["10.0.0.8".to_string()]);
        assert_eq!(node.public_ips, vec!["165.180.1.2".to_string()]);
        assert_eq!(node.extra.memory_mb, Some(4096));
        assert_eq!(node.extra.cpu_count, Some(2));
        assert_eq!(node.extra.network_domain_id.as_deref(), Some("ND1"));
        assert_eq!(node.extra.datacenter_id.as_deref(), Some("NA9"));
        assert_eq!(node.extra.os_id.as_deref(), Some("UBUNTU1264"));
        assert_eq!(node.extra.os_type.as_deref(), Some("UNIX"));
        assert_eq!(node.extra.os_display_name.as_deref(), Some("UBUNTU12/64"));
        assert_eq!(node.extra.deployed_time.as_deref(), Some("2015-09-24T14:26:01.000Z"));
        assert!(node.extra.status.is_empty());
    }

    #[test]
    fn test_node_with_legacy_nic() {
        let node = to_node(&server(
            r#"<name>db1</name>
               <networkId>NET1</networkId>
               <nic privateIpv4="10.1.1.1"/>
               <started>false</started>"#,
        ))
        .unwrap();

        assert_eq!(node.state, NodeState::Terminated);
        assert_eq!(node.private_ips, vec!["10.1.1.1".to_string()]);
        assert!(node.public_ips.is_empty());
        assert_eq!(node.extra.network_id.as_deref(), Some("NET1"));
        assert_eq!(node.extra.network_domain_id, None);
        assert_eq!(node.extra.memory_mb, None);
    }

    #[test]
    fn test_node_without_any_nic() {
        let node = to_node(&server("<name>bare</name><started>true</started>")).unwrap();
        assert!(node.private_ips.is_empty());

        let node = to_node(&server(r#"<networkInfo networkDomainId="ND1"/>"#)).unwrap();
        assert!(node.private_ips.is_empty());
        assert_eq!(node.state, NodeState::Terminated);
    }

    #[test]
    fn test_node_progress_status() {
        let node = to_node(&server(
            r"<started>false</started>
              <progress>
                  <action>DEPLOY_SERVER</action>
                  <requestTime>2015-09-24T14:26:01.000Z</requestTime>
                  <userName>devuser1</userName>
                  <numberOfSteps>3</numberOfSteps>
                  <step><name>CLONE_IMAGE</name><number>1</number><percentComplete>40</percentComplete></step>
              </progress>",
        ))
        .unwrap();

        let status = node.extra.status;
        assert_eq!(status.action.as_deref(), Some("DEPLOY_SERVER"));
        assert_eq!(status.user_name.as_deref(), Some("devuser1"));
        assert_eq!(status.number_of_steps.as_deref(), Some("3"));
        assert_eq!(status.step_name.as_deref(), Some("CLONE_IMAGE"));
        assert_eq!(status.step_number.as_deref(), Some("1"));
        assert_eq!(status.step_percent_complete.as_deref(), Some("40"));
        assert_eq!(status.failure_reason, None);
    }

    #[test]
    fn test_node_rejects_bad_numbers() {
        let err = to_node(&server("<memoryGb>lots</memoryGb>")).unwrap_err();
        assert!(matches!(err, ComputeError::MalformedResponse(_)));
    }

    #[test]
    fn test_node_rejects_oversized_memory() {
        let err = to_node(&server("<memoryGb>18014398509481984</memoryGb>")).unwrap_err();
        assert!(matches!(err, ComputeError::MalformedResponse(ref msg) if msg.contains("memoryGb")));

        let node = to_node(&server("<memoryGb>1024</memoryGb>")).unwrap();
        assert_eq!(node.extra.memory_mb, Some(1_048_576));
    }

    #[test]
    fn test_node_requires_id() {
        let element =
            Element::parse(r#"<server xmlns="urn:didata.com:api:cloud:types"/>"#).unwrap();
        assert!(matches!(
            to_node(&element),
            Err(ComputeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_to_locations() {
        let doc = Element::parse(
            r#"<datacenters xmlns="urn:didata.com:api:cloud:types">
                <datacenter id="NA9" type="MCP 2.0">
                    <displayName>US - East 3 - MCP 2.0</displayName>
                    <city>Ashburn</city>
                    <country>US</country>
                </datacenter>
                <datacenter id="EU6"><displayName>Europe 6</displayName><country>DE</country></datacenter>
            </datacenters>"#,
        )
        .unwrap();

        let locations = to_locations(&doc).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].id, "NA9");
        assert_eq!(locations[0].name, "US - East 3 - MCP 2.0");
        assert_eq!(locations[1].country, "DE");
    }

    #[test]
    fn test_base_image_resolves_location() {
        let doc = Element::parse(
            r#"<ns3:ServerImageWithStates xmlns:ns3="http://oec.api.opsource.net/schemas/server">
                <ns3:image id="IMG1" location="EU6">
                    <ns3:name>RedHat 6 64-bit 2 CPU</ns3:name>
                    <ns3:description>RedHat 6.6 Enterprise</ns3:description>
                    <ns3:operatingSystem>
                        <ns3:type>UNIX</ns3:type>
                        <ns3:displayName>REDHAT6/64</ns3:displayName>
                    </ns3:operatingSystem>
                    <ns3:cpuCount>2</ns3:cpuCount>
                    <ns3:resourcePath>/oec/base/image/IMG1</ns3:resourcePath>
                    <ns3:memory>4096</ns3:memory>
                    <ns3:osStorage>10</ns3:osStorage>
                    <ns3:additionalStorage>0</ns3:additionalStorage>
                    <ns3:created>2015-03-19T18:09:29.000Z</ns3:created>
                </ns3:image>
            </ns3:ServerImageWithStates>"#,
        )
        .unwrap();

        let images = to_base_images(&doc, &locations()).unwrap();
        assert_eq!(images.len(), 1);
        let image = &images[0];
        assert_eq!(image.id, "IMG1");
        assert_eq!(image.name, "RedHat 6 64-bit 2 CPU");
        assert_eq!(image.extra.location.id, "EU6");
        assert_eq!(image.extra.os_type.as_deref(), Some("UNIX"));
        assert_eq!(image.extra.os_display_name.as_deref(), Some("REDHAT6/64"));
        assert_eq!(image.extra.cpu_count, Some(2));
        assert_eq!(image.extra.memory, Some(4096));
        assert_eq!(image.extra.os_storage, Some(10));
    }

    #[test]
    fn test_base_image_unknown_location() {
        let doc = Element::parse(
            r#"<images xmlns="http://oec.api.opsource.net/schemas/server">
                <image id="IMG1" location="AP1"><name>x</name></image>
            </images>"#,
        )
        .unwrap();

        let err = to_base_images(&doc, &locations()).unwrap_err();
        assert!(matches!(err, ComputeError::NotFound(_)));
    }

    #[test]
    fn test_network_mapping() {
        let doc = Element::parse(
            r#"<ns4:NetworkWithLocations xmlns:ns4="http://oec.api.opsource.net/schemas/network">
                <ns4:network>
                    <ns4:id>NET1</ns4:id>
                    <ns4:name>test-net1</ns4:name>
                    <ns4:description>Test Network</ns4:description>
                    <ns4:location>NA9</ns4:location>
                    <ns4:privateNet>10.162.1.0</ns4:privateNet>
                    <ns4:multicast>true</ns4:multicast>
                    <ns4:status><ns4:action>ADD_NETWORK</ns4:action></ns4:status>
                </ns4:network>
                <ns4:network>
                    <ns4:id>NET2</ns4:id>
                    <ns4:name>test-net2</ns4:name>
                    <ns4:location>EU6</ns4:location>
                    <ns4:multicast>false</ns4:multicast>
                </ns4:network>
            </ns4:NetworkWithLocations>"#,
        )
        .unwrap();

        let networks = to_networks(&doc, &locations()).unwrap();
        assert_eq!(networks.len(), 2);
        assert_eq!(networks[0].id, "NET1");
        assert!(networks[0].multicast);
        assert_eq!(networks[0].private_net.as_deref(), Some("10.162.1.0"));
        assert_eq!(networks[0].status.action.as_deref(), Some("ADD_NETWORK"));
        assert_eq!(networks[1].location.id, "EU6");
        assert!(!networks[1].multicast);
        assert!(networks[1].status.is_empty());
    }

    #[test]
    fn test_network_domain_and_vlan_mapping() {
        let domains = Element::parse(
            r#"<networkDomains xmlns="urn:didata.com:api:cloud:types">
                <networkDomain id="ND1" datacenterId="NA9">
                    <name>Production</name>
                    <description>prod domain</description>
                    <type>ESSENTIALS</type>
                </networkDomain>
            </networkDomains>"#,
        )
        .unwrap();
        let domains = to_network_domains(&domains, &locations()).unwrap();
        assert_eq!(domains[0].id, "ND1");
        assert_eq!(domains[0].name, "Production");
        assert_eq!(domains[0].location.id, "NA9");
        assert!(domains[0].status.is_empty());

        let vlans = Element::parse(
            r#"<vlans xmlns="urn:didata.com:api:cloud:types">
                <vlan id="VLAN1" datacenterId="EU6">
                    <networkDomain id="ND1" name="Production"/>
                    <name>web</name>
                    <state><action>DEPLOY_VLAN</action></state>
                </vlan>
            </vlans>"#,
        )
        .unwrap();
        let vlans = to_vlans(&vlans, &locations()).unwrap();
        assert_eq!(vlans[0].id, "VLAN1");
        assert_eq!(vlans[0].location.country, "DE");
        assert_eq!(vlans[0].network_domain_id.as_deref(), Some("ND1"));
        assert_eq!(vlans[0].status.action.as_deref(), Some("DEPLOY_VLAN"));
    }
}
