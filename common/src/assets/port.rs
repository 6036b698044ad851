use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

/// A service seen on an address. Several may exist per address; no key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub number: u16,
    pub proto: String,
    pub status: String,
    pub service_name: String,
    pub ip: IpAddr,
    pub certs: Option<String>,
    pub info: BTreeMap<String, String>,
}

impl Port {
    pub fn new(ip: IpAddr, number: u16, proto: impl Into<String>) -> Self {
        Self {
            number,
            proto: proto.into(),
            status: String::from("open"),
            service_name: String::new(),
            ip,
            certs: None,
            info: BTreeMap::new(),
        }
    }

    pub fn with_service(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.proto, self.number, self.service_name)
    }
}
