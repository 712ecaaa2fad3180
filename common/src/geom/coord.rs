use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub z: u8,
}

impl GridCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, M{})", self.x, self.y, u16::from(self.z) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_display_one_based() {
        assert_eq!(GridCoord::new(3, 4, 0).to_string(), "(3, 4, M1)");
        assert_eq!(GridCoord::new(0, 0, 255).to_string(), "(0, 0, M256)");
    }
}
