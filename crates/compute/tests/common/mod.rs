//! Shared fixtures for driver integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cto_compute::providers::dimensiondata::{ApiRequest, Connection};
use cto_compute::providers::ComputeError;
use cto_compute::xml::Element;

/// In-memory [`Connection`] that answers by action path and records every
/// request it receives.
#[derive(Default)]
pub struct RecordingConnection {
    responses: HashMap<String, String>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for `action` with `xml`.
    pub fn respond(mut self, action: &str, xml: &str) -> Self {
        self.responses.insert(action.to_string(), xml.to_string());
        self
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Actions of every request received so far, in order.
    pub fn actions(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.action).collect()
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn request(&self, request: ApiRequest) -> Result<Element, ComputeError> {
        let action = request.action.clone();
        self.requests.lock().unwrap().push(request);

        let xml = self
            .responses
            .get(&action)
            .ok_or_else(|| ComputeError::NotFound(format!("no canned response for {action}")))?;
        Ok(Element::parse(xml)?)
    }
}

pub const DATACENTERS: &str = r#"<datacenters xmlns="urn:didata.com:api:cloud:types">
    <datacenter id="NA9" type="MCP 2.0">
        <displayName>US - East 3 - MCP 2.0</displayName>
        <city>Ashburn</city>
        <country>US</country>
    </datacenter>
    <datacenter id="EU6" type="MCP 2.0">
        <displayName>Europe (Frankfurt) - MCP 2.0</displayName>
        <city>Frankfurt</city>
        <country>DE</country>
    </datacenter>
</datacenters>"#;

pub const SERVER_SRV1: &str = r#"<server xmlns="urn:didata.com:api:cloud:types" id="SRV1" datacenterId="NA9">
    <name>web1</name>
    <description>front end</description>
    <operatingSystem id="UBUNTU1264" displayName="UBUNTU12/64" family="UNIX"/>
    <cpuCount>2</cpuCount>
    <memoryGb>4</memoryGb>
    <networkId>NET1</networkId>
    <nic privateIpv4="10.162.1.10"/>
    <sourceImageId>IMG1</sourceImageId>
    <createTime>2015-09-24T14:26:01.000Z</createTime>
    <started>true</started>
    <progress>
        <action>DEPLOY_SERVER</action>
        <requestTime>2015-09-24T14:26:01.000Z</requestTime>
        <userName>devuser1</userName>
    </progress>
</server>"#;

pub const SERVERS: &str = r#"<servers xmlns="urn:didata.com:api:cloud:types" pageNumber="1" pageCount="2" totalCount="2" pageSize="250">
    <Server id="SRV1" datacenterId="NA9">
        <name>web1</name>
        <cpuCount>2</cpuCount>
        <memoryGb>4</memoryGb>
        <networkInfo networkDomainId="ND1">
            <primaryNic id="NIC1" privateIpv4="10.0.0.8" vlanId="VLAN1"/>
        </networkInfo>
        <publicIpAddress>165.180.1.2</publicIpAddress>
        <started>true</started>
    </Server>
    <Server id="SRV2" datacenterId="EU6">
        <name>db1</name>
        <cpuCount>4</cpuCount>
        <memoryGb>8</memoryGb>
        <nic privateIpv4="10.1.1.1"/>
        <started>false</started>
    </Server>
</servers>"#;

pub const DEPLOY_ACCEPTED: &str = r#"<response xmlns="urn:didata.com:api:cloud:types" requestId="na9/2015-09-24T14:26:01.000Z/abc">
    <operation>DEPLOY_SERVER</operation>
    <responseCode>IN_PROGRESS</responseCode>
    <message>Request to deploy Server 'web1' has been accepted and is being processed.</message>
    <info name="serverId" value="SRV1"/>
</response>"#;

pub fn action_response(code: &str) -> String {
    format!(
        r#"<response xmlns="urn:didata.com:api:cloud:types">
    <operation>SERVER_ACTION</operation>
    <responseCode>{code}</responseCode>
    <message>Server action response.</message>
</response>"#
    )
}
