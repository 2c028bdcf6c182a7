//! User-agent classification
//!
//! Reduces a raw `User-Agent` header to the single identifier theme rules are
//! matched against: a mobile device name, a browser name with its version, or
//! a robot name. Tables are checked in that order and the first hit wins.

/// Mobile devices: (case-insensitive needle, display name)
const MOBILES: &[(&str, &str)] = &[
    ("mobileexplorer", "Mobile Explorer"),
    ("palmsource", "Palm"),
    ("palmscape", "Palmscape"),
    ("motorola", "Motorola"),
    ("nokia", "Nokia"),
    ("palm", "Palm"),
    ("iphone", "Apple iPhone"),
    ("ipad", "iPad"),
    ("ipod", "Apple iPod Touch"),
    ("sony", "Sony Ericsson"),
    ("ericsson", "Sony Ericsson"),
    ("blackberry", "BlackBerry"),
    ("cocoon", "O2 Cocoon"),
    ("blazer", "Treo"),
    ("lg", "LG"),
    ("amoi", "Amoi"),
    ("xda", "XDA"),
    ("mda", "MDA"),
    ("vario", "Vario"),
    ("htc", "HTC"),
    ("samsung", "Samsung"),
    ("sharp", "Sharp"),
    ("sie-", "Siemens"),
    ("alcatel", "Alcatel"),
    ("benq", "BenQ"),
    ("ipaq", "HP iPaq"),
    ("mot-", "Motorola"),
    ("playstation portable", "PlayStation Portable"),
    ("hiptop", "Danger Hiptop"),
    ("nec-", "NEC"),
    ("panasonic", "Panasonic"),
    ("philips", "Philips"),
    ("sagem", "Sagem"),
    ("sanyo", "Sanyo"),
    ("spv", "SPV"),
    ("zte", "ZTE"),
    ("sendo", "Sendo"),
    ("android", "Android"),
    ("symbian", "Symbian"),
    ("SymbianOS", "SymbianOS"),
    ("elaine", "Palm"),
    ("series60", "Symbian S60"),
    ("windows ce", "Windows CE"),
    ("obigo", "Obigo"),
    ("netfront", "Netfront Browser"),
    ("openwave", "Openwave Browser"),
    ("mobilexplorer", "Mobile Explorer"),
    ("operamini", "Opera Mini"),
    ("opera mini", "Opera Mini"),
    ("digital paths", "Digital Paths"),
    ("avantgo", "AvantGo"),
    ("xiino", "Xiino"),
    ("novarra", "Novarra Transcoder"),
    ("vodafone", "Vodafone"),
    ("docomo", "NTT DoCoMo"),
    ("o2", "O2"),
    ("mobile", "Generic Mobile"),
    ("wireless", "Generic Mobile"),
    ("j2me", "Generic Mobile"),
    ("midp", "Generic Mobile"),
    ("cldc", "Generic Mobile"),
    ("up.link", "Generic Mobile"),
    ("up.browser", "Generic Mobile"),
    ("smartphone", "Generic Mobile"),
    ("cellphone", "Generic Mobile"),
];

/// Browsers: (case-insensitive needle, display name). Order matters: more
/// specific engines come before the ones they embed (Chrome before Safari).
const BROWSERS: &[(&str, &str)] = &[
    ("Flock", "Flock"),
    ("Chrome", "Chrome"),
    ("Opera", "Opera"),
    ("MSIE", "Internet Explorer"),
    ("Internet Explorer", "Internet Explorer"),
    ("Shiira", "Shiira"),
    ("Firefox", "Firefox"),
    ("Chimera", "Chimera"),
    ("Phoenix", "Phoenix"),
    ("Firebird", "Firebird"),
    ("Camino", "Camino"),
    ("Netscape", "Netscape"),
    ("OmniWeb", "OmniWeb"),
    ("Safari", "Safari"),
    ("Mozilla", "Mozilla"),
    ("Konqueror", "Konqueror"),
    ("icab", "iCab"),
    ("Lynx", "Lynx"),
    ("Links", "Links"),
    ("hotjava", "HotJava"),
    ("amaya", "Amaya"),
    ("IBrowse", "IBrowse"),
];

/// Robots: (case-insensitive needle, display name)
const ROBOTS: &[(&str, &str)] = &[
    ("googlebot", "Googlebot"),
    ("msnbot", "MSNBot"),
    ("bingbot", "Bing"),
    ("slurp", "Inktomi Slurp"),
    ("yahoo", "Yahoo"),
    ("askjeeves", "AskJeeves"),
    ("fastcrawler", "FastCrawler"),
    ("infoseek", "InfoSeek Robot 1.0"),
    ("lycos", "Lycos"),
];

/// Classification of a requesting user agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAgent {
    /// A known mobile device
    Mobile(String),
    /// A desktop browser and its version (possibly empty)
    Browser {
        /// Browser display name
        name: String,
        /// Version digits following the browser token
        version: String,
    },
    /// A known crawler
    Robot(String),
    /// Nothing in the tables matched
    Unknown,
}

impl UserAgent {
    /// Classify a raw `User-Agent` header value
    pub fn parse(raw: &str) -> Self {
        let haystack = raw.to_ascii_lowercase();

        if let Some((_, name)) = find(&haystack, MOBILES) {
            return Self::Mobile(name.to_string());
        }

        if let Some((needle, name)) = find(&haystack, BROWSERS) {
            return Self::Browser {
                name: name.to_string(),
                version: version_after(&haystack, needle),
            };
        }

        if let Some((_, name)) = find(&haystack, ROBOTS) {
            return Self::Robot(name.to_string());
        }

        Self::Unknown
    }

    /// The identifier theme rules are matched against, if any
    pub fn classified(&self) -> Option<String> {
        match self {
            Self::Mobile(name) | Self::Robot(name) => Some(name.clone()),
            Self::Browser { name, version } if version.is_empty() => Some(name.clone()),
            Self::Browser { name, version } => Some(format!("{} {}", name, version)),
            Self::Unknown => None,
        }
    }

    /// Whether the agent is a mobile device
    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Mobile(_))
    }

    /// Whether the agent is a crawler
    pub fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }
}

fn find(
    haystack: &str,
    table: &'static [(&'static str, &'static str)],
) -> Option<(&'static str, &'static str)> {
    table
        .iter()
        .find(|(needle, _)| haystack.contains(&needle.to_ascii_lowercase()))
        .copied()
}

/// First run of digits and dots after `needle`
fn version_after(haystack: &str, needle: &str) -> String {
    let needle = needle.to_ascii_lowercase();
    let Some(start) = haystack.find(&needle) else {
        return String::new();
    };
    let rest = &haystack[start + needle.len()..];
    let Some(first) = rest.find(|c: char| c.is_ascii_digit()) else {
        return String::new();
    };
    rest[first..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_iphone_is_mobile() {
        let agent = UserAgent::parse(IPHONE);
        assert_eq!(agent, UserAgent::Mobile("Apple iPhone".to_string()));
        assert_eq!(agent.classified().as_deref(), Some("Apple iPhone"));
    }

    #[test]
    fn test_ipod() {
        let agent = UserAgent::parse("Mozilla/5.0 (iPod touch; CPU iPhone OS 12_0)");
        // iphone appears in the string before ipod is checked
        assert_eq!(agent.classified().as_deref(), Some("Apple iPhone"));

        let agent = UserAgent::parse("Mozilla/5.0 (iPod; U; CPU OS 4_3)");
        assert_eq!(agent.classified().as_deref(), Some("Apple iPod Touch"));
    }

    #[test]
    fn test_browser_with_version() {
        let agent = UserAgent::parse("Mozilla/4.0 (compatible; MSIE 6.0; Windows NT 5.1)");
        assert_eq!(
            agent,
            UserAgent::Browser {
                name: "Internet Explorer".to_string(),
                version: "6.0".to_string(),
            }
        );
        assert_eq!(agent.classified().as_deref(), Some("Internet Explorer 6.0"));
    }

    #[test]
    fn test_chrome_before_safari() {
        let agent = UserAgent::parse(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.6099.71 Safari/537.36",
        );
        assert_eq!(agent.classified().as_deref(), Some("Chrome 120.0.6099.71"));
    }

    #[test]
    fn test_robot() {
        let agent = UserAgent::parse("Googlebot/2.1 (+http://www.google.com/bot.html)");
        assert!(agent.is_robot());
        assert_eq!(agent.classified().as_deref(), Some("Googlebot"));
    }

    #[test]
    fn test_unknown() {
        let agent = UserAgent::parse("curl/8.4.0");
        assert_eq!(agent, UserAgent::Unknown);
        assert_eq!(agent.classified(), None);
    }
}
