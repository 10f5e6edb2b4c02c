/// Root of the player resource paths.
pub const RESOURCE_ROOT: &str = "/player/mjs";

/// Builds public resource URLs: `{public_base}/player/mjs/{name}[/{func}[/{item}]]`.
#[derive(Debug, Clone, Default)]
pub struct Links {
    public_base: String,
}

impl Links {
    pub fn new(public_base: &str) -> Self {
        Self { public_base: public_base.trim_end_matches('/').to_string() }
    }

    pub fn resource(&self, segments: &[&str]) -> String {
        let mut out = format!("{}{}", self.public_base, RESOURCE_ROOT);
        for seg in segments {
            out.push('/');
            out.push_str(seg);
        }
        out
    }

    /// The only identifier clients ever get for a playlist entry.
    pub fn playlist_item(&self, name: &str, uid: &str) -> String {
        self.resource(&[name, "playlist", uid])
    }

    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.public_base, path)
        }
    }
}
