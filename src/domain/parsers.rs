//! Parsers for the text output of diagnostic commands.
//!
//! Each parser takes raw stdout and returns typed fields, with `None` for a
//! field the output did not contain.

use regex::Regex;

/// Fields read from `hostnamectl`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub operating_system: Option<String>,
    pub hardware_vendor: Option<String>,
    pub hardware_model: Option<String>,
}

/// Parse plain `hostnamectl` output.
///
/// The JSON mode is not used because older systemd releases lack it.
pub fn parse_hostnamectl(output: &str) -> HostInfo {
    HostInfo {
        operating_system: labelled_field(output, "Operating System"),
        hardware_vendor: labelled_field(output, "Hardware Vendor"),
        hardware_model: labelled_field(output, "Hardware Model"),
    }
}

/// Value of an indented `Name: value` line.
fn labelled_field(output: &str, name: &str) -> Option<String> {
    let pattern = format!(r"(?m)^\s*{}: (.*)$", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end().to_string())
}

const FLATHUB_URL: &str = "https://dl.flathub.org/repo/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlathubState {
    Enabled,
    /// Configured with a filter that hides part of the repository.
    Filtered,
    Absent,
}

/// Parse `flatpak remotes --columns url,filter`.
pub fn parse_flatpak_remotes(output: &str) -> FlathubState {
    let pattern = format!(r"({})\s*(\S*)", regex::escape(FLATHUB_URL));
    let Ok(re) = Regex::new(&pattern) else {
        return FlathubState::Absent;
    };
    match re.captures(output).and_then(|caps| caps.get(2)) {
        Some(filter) if filter.as_str() == "-" => FlathubState::Enabled,
        Some(_) => FlathubState::Filtered,
        None => FlathubState::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOSTNAMECTL: &str = "\
 Static hostname: workstation
       Icon name: computer-laptop
         Chassis: laptop 💻
      Machine ID: 0123456789abcdef0123456789abcdef
Operating System: Fedora Linux 40 (Workstation Edition)
     CPE OS Name: cpe:/o:fedoraproject:fedora:40
          Kernel: Linux 6.8.9-300.fc40.x86_64
    Architecture: x86-64
 Hardware Vendor: Lenovo
  Hardware Model: ThinkPad X1 Carbon Gen 9
";

    #[test]
    fn test_parse_hostnamectl_full() {
        let info = parse_hostnamectl(HOSTNAMECTL);
        assert_eq!(
            info.operating_system.as_deref(),
            Some("Fedora Linux 40 (Workstation Edition)")
        );
        assert_eq!(info.hardware_vendor.as_deref(), Some("Lenovo"));
        assert_eq!(
            info.hardware_model.as_deref(),
            Some("ThinkPad X1 Carbon Gen 9")
        );
    }

    #[test]
    fn test_parse_hostnamectl_virtual_machine_lacks_hardware() {
        let output = " Static hostname: vm\nOperating System: Debian GNU/Linux 12 (bookworm)\n";
        let info = parse_hostnamectl(output);
        assert_eq!(
            info.operating_system.as_deref(),
            Some("Debian GNU/Linux 12 (bookworm)")
        );
        assert_eq!(info.hardware_vendor, None);
        assert_eq!(info.hardware_model, None);
    }

    #[test]
    fn test_parse_flatpak_remotes_enabled() {
        let output = "https://dl.flathub.org/repo/\t-\nhttps://example.org/repo/\t-\n";
        assert_eq!(parse_flatpak_remotes(output), FlathubState::Enabled);
    }

    #[test]
    fn test_parse_flatpak_remotes_filtered() {
        let output = "https://dl.flathub.org/repo/\t/usr/share/flatpak/fedora-flathub.filter\n";
        assert_eq!(parse_flatpak_remotes(output), FlathubState::Filtered);
    }

    #[test]
    fn test_parse_flatpak_remotes_absent() {
        assert_eq!(
            parse_flatpak_remotes("https://registry.fedoraproject.org/\t-\n"),
            FlathubState::Absent
        );
        assert_eq!(parse_flatpak_remotes(""), FlathubState::Absent);
    }
}
