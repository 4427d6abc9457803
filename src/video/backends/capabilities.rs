use std::cmp;

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

/// Represents the capabilities of the context. Contrary to the state, these
/// values never change.
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub version: Version,
    /// The name of the renderer.
    pub renderer: String,
    pub extensions: Vec<String>,
    /// Maximum number of textures that can be bound to a program.
    pub max_texture_units: u32,
    /// Maximum number of color attachment bind points.
    pub max_color_attachments: u32,
    pub max_vertex_attributes: u32,
}

impl Capabilities {
    /// The limits reported by the headless visitor.
    pub fn headless() -> Self {
        Capabilities {
            version: Version::GL(3, 3),
            renderer: "headless".into(),
            extensions: Vec::new(),
            max_texture_units: 16,
            max_color_attachments: 4,
            max_vertex_attributes: 16,
        }
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|v| v == name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version() {
        assert!(Version::GL(3, 3) > Version::GL(3, 0));
        assert!(Version::GL(4, 0) > Version::GL(3, 3));
        assert!(!(Version::GL(3, 0) >= Version::ES(3, 0)));
        assert!(!(Version::ES(3, 0) >= Version::GL(3, 0)));
    }
}
