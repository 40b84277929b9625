//! Boot-file URL templating.
//!
//! The operator supplies a URL template for UEFI HTTP boot; the only fields
//! exposed to it are `MAC`, `BaseAddress` and `Payload`. Nothing else leaks
//! into the template scope, so an operator-supplied template can be treated
//! as configuration rather than code.

use crate::arch::ClientArch;
use crate::error::Result;
use base64::{engine::general_purpose, Engine as _};
use damselfly_common::MacAddr;
use minijinja::{context, Environment};
use std::net::Ipv6Addr;

const TEMPLATE_NAME: &str = "boot_url";

/// A compiled boot-URL template.
pub struct BootUrlTemplate {
    env: Environment<'static>,
}

impl BootUrlTemplate {
    /// Compile an operator-supplied template, e.g.
    /// `http://netboot.target/?mac={{ MAC }}&payload={{ Payload }}`.
    pub fn parse(source: &str) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME.to_string(), source.to_string())?;
        Ok(BootUrlTemplate { env })
    }

    pub fn render(
        &self,
        mac: MacAddr,
        base_address: Ipv6Addr,
        archs: &[ClientArch],
    ) -> Result<String> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        let url = template.render(context! {
            MAC => mac.to_string(),
            BaseAddress => base_address.to_string(),
            Payload => arch_payload(archs),
        })?;
        Ok(url)
    }
}

/// Base64 of `{"architectures":[...]}` with canonical registry names, so the
/// boot target can pick artifacts without re-parsing DHCP options.
fn arch_payload(archs: &[ClientArch]) -> String {
    let names: Vec<&str> = archs.iter().map(|arch| arch.name()).collect();
    let json = serde_json::json!({ "architectures": names }).to_string();
    general_purpose::STANDARD.encode(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac() -> MacAddr {
        "04:42:1a:03:9b:20".parse().unwrap()
    }

    #[test]
    fn test_render_substitutes_all_fields() {
        let template =
            BootUrlTemplate::parse("http://[{{ BaseAddress }}]/boot?mac={{ MAC }}&p={{ Payload }}")
                .unwrap();
        let url = template
            .render(mac(), "fec0::".parse().unwrap(), &[ClientArch::EfiX86_64])
            .unwrap();
        let payload = general_purpose::STANDARD.encode(r#"{"architectures":["EFI_X86_64"]}"#);
        assert_eq!(
            url,
            format!("http://[fec0::]/boot?mac=04:42:1a:03:9b:20&p={payload}")
        );
    }

    #[test]
    fn test_empty_arch_list_payload() {
        let template = BootUrlTemplate::parse("{{ Payload }}").unwrap();
        let url = template.render(mac(), "fec0::".parse().unwrap(), &[]).unwrap();
        assert_eq!(
            general_purpose::STANDARD.decode(url).unwrap(),
            br#"{"architectures":[]}"#
        );
    }

    #[test]
    fn test_parse_rejects_bad_template() {
        assert!(BootUrlTemplate::parse("{{ unclosed").is_err());
    }
}
