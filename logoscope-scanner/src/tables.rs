// Keyword tables consulted by the scorer and the site-name resolver

/// Infrastructure labels that never carry the brand name.
pub const COMMON_SUBDOMAINS: &[&str] = &[
    "www", "www2", "admin", "app", "apps", "api", "blog", "cdn", "static", "assets", "media",
    "images", "img", "shop", "store", "mail", "portal", "dev", "staging", "m", "mobile", "secure",
    "files", "docs", "support", "help", "web", "en",
];

/// Well-known third-party brands that show up as badges, share buttons and
/// payment marks on almost every site.
pub const THIRD_PARTY_NAMES: &[&str] = &[
    "google", "facebook", "twitter", "instagram", "linkedin", "youtube", "tiktok", "pinterest",
    "whatsapp", "telegram", "snapchat", "reddit", "apple", "appstore", "app-store", "googleplay",
    "google-play", "playstore", "microsoft", "amazon", "paypal", "stripe", "visa", "mastercard",
    "amex", "klarna", "trustpilot", "shopify", "wordpress", "wix", "squarespace", "hubspot",
    "mailchimp", "zendesk", "intercom", "cloudflare", "gravatar", "spotify", "github", "norton",
    "mcafee", "recaptcha", "vimeo",
];

/// Words suggesting the image belongs to another organization.
pub const ORGANIZATION_TOKENS: &[&str] = &[
    "partner", "sponsor", "affiliate", "certified", "certification", "certificate", "award",
    "member", "association", "accredit", "badge", "client", "customer",
];

/// Path segments that hold other people's logos.
pub const PARTNER_SEGMENTS: &[&str] = &[
    "/partners/", "/partner/", "/ads/", "/ad/", "/sponsors/", "/sponsor/", "/affiliates/",
    "/clients/", "/advertising/", "/banners/",
];

/// Filename words that, without "logo", point at partner content.
pub const PARTNER_WORDS: &[&str] = &["partner", "sponsor", "advert", "affiliate", "badge"];

/// Sprite fragment tokens that identify the brand mark.
pub const LOGO_FRAGMENT_TOKENS: &[&str] = &["logo", "brand", "wordmark", "logotype", "site-mark"];

/// Configuration data handed to the scorer and identity resolver.
///
/// Defaults come from the constant tables above; tests and callers may swap
/// any list out.
#[derive(Debug, Clone)]
pub struct KeywordTables {
    pub common_subdomains: Vec<String>,
    pub third_party_names: Vec<String>,
    pub organization_tokens: Vec<String>,
    pub partner_segments: Vec<String>,
    pub partner_words: Vec<String>,
    pub logo_fragment_tokens: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            common_subdomains: owned(COMMON_SUBDOMAINS),
            third_party_names: owned(THIRD_PARTY_NAMES),
            organization_tokens: owned(ORGANIZATION_TOKENS),
            partner_segments: owned(PARTNER_SEGMENTS),
            partner_words: owned(PARTNER_WORDS),
            logo_fragment_tokens: owned(LOGO_FRAGMENT_TOKENS),
        }
    }
}

impl KeywordTables {
    pub fn with_third_party_names(mut self, names: &[&str]) -> Self {
        self.third_party_names = owned(names);
        self
    }

    pub fn with_common_subdomains(mut self, labels: &[&str]) -> Self {
        self.common_subdomains = owned(labels);
        self
    }

    /// First third-party name found in `haystack` (already lowercased) that
    /// is not the site's own brand. An empty or short `site_name` suppresses
    /// nothing.
    pub fn foreign_brand_in<'a>(&'a self, haystack: &str, site_name: &str) -> Option<&'a str> {
        let own = |name: &str| site_name.chars().count() > 2 && name.contains(site_name);
        self.third_party_names
            .iter()
            .map(String::as_str)
            .filter(|name| !own(name))
            .find(|name| haystack.contains(name))
    }

    pub fn has_organization_token(&self, haystack: &str) -> bool {
        self.organization_tokens
            .iter()
            .any(|t| haystack.contains(t.as_str()))
    }

    pub fn has_partner_segment(&self, path: &str) -> bool {
        self.partner_segments.iter().any(|s| path.contains(s.as_str()))
    }

    pub fn has_partner_word(&self, filename: &str) -> bool {
        self.partner_words.iter().any(|w| filename.contains(w.as_str()))
    }

    pub fn is_logo_fragment(&self, fragment: &str) -> bool {
        let fragment = fragment.to_lowercase();
        self.logo_fragment_tokens
            .iter()
            .any(|t| fragment.contains(t.as_str()))
    }

    pub fn is_common_subdomain(&self, label: &str) -> bool {
        self.common_subdomains.iter().any(|s| s == label)
    }
}
