pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun.cloudflare.com:3478";

/// Fallback ICE urls used until the server hands out its own list.
pub fn default_stun_urls() -> Vec<String> {
    [DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
