use image::Rgb;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
    pub name: &'static str,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl NamedColor {
    const fn new(name: &'static str, red: u8, green: u8, blue: u8) -> Self {
        Self {
            name,
            red,
            green,
            blue,
        }
    }

    pub fn rgb(&self) -> Rgb<u8> {
        Rgb([self.red, self.green, self.blue])
    }
}

impl fmt::Display for NamedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub const WHITE: NamedColor = NamedColor::new("white", 255, 255, 255);

// Order matters: colors are picked by `class_id mod len`.
// `mediumgreen` has no CSS definition, so it gets its own fixed value.
const CLASS_COLORS: [NamedColor; 73] = [
    NamedColor::new("red", 255, 0, 0),
    NamedColor::new("blue", 0, 0, 255),
    NamedColor::new("green", 0, 128, 0),
    NamedColor::new("yellow", 255, 255, 0),
    NamedColor::new("purple", 128, 0, 128),
    NamedColor::new("orange", 255, 165, 0),
    NamedColor::new("pink", 255, 192, 203),
    NamedColor::new("cyan", 0, 255, 255),
    NamedColor::new("magenta", 255, 0, 255),
    NamedColor::new("lime", 0, 255, 0),
    NamedColor::new("navy", 0, 0, 128),
    NamedColor::new("maroon", 128, 0, 0),
    NamedColor::new("olive", 128, 128, 0),
    NamedColor::new("teal", 0, 128, 128),
    NamedColor::new("silver", 192, 192, 192),
    NamedColor::new("gray", 128, 128, 128),
    NamedColor::new("darkred", 139, 0, 0),
    NamedColor::new("darkblue", 0, 0, 139),
    NamedColor::new("darkgreen", 0, 100, 0),
    NamedColor::new("gold", 255, 215, 0),
    NamedColor::new("indigo", 75, 0, 130),
    NamedColor::new("coral", 255, 127, 80),
    NamedColor::new("hotpink", 255, 105, 180),
    NamedColor::new("lightblue", 173, 216, 230),
    NamedColor::new("lightgreen", 144, 238, 144),
    NamedColor::new("lightcoral", 240, 128, 128),
    NamedColor::new("lightgray", 211, 211, 211),
    NamedColor::new("mediumblue", 0, 0, 205),
    NamedColor::new("mediumgreen", 0, 168, 107),
    NamedColor::new("mediumpurple", 147, 112, 219),
    NamedColor::new("mediumseagreen", 60, 179, 113),
    NamedColor::new("mediumslateblue", 123, 104, 238),
    NamedColor::new("mediumturquoise", 72, 209, 204),
    NamedColor::new("mediumvioletred", 199, 21, 133),
    NamedColor::new("midnightblue", 25, 25, 112),
    NamedColor::new("mistyrose", 255, 228, 225),
    NamedColor::new("moccasin", 255, 228, 181),
    NamedColor::new("navajowhite", 255, 222, 173),
    NamedColor::new("oldlace", 253, 245, 230),
    NamedColor::new("olivedrab", 107, 142, 35),
    NamedColor::new("orangered", 255, 69, 0),
    NamedColor::new("orchid", 218, 112, 214),
    NamedColor::new("palegoldenrod", 238, 232, 170),
    NamedColor::new("palegreen", 152, 251, 152),
    NamedColor::new("paleturquoise", 175, 238, 238),
    NamedColor::new("palevioletred", 219, 112, 147),
    NamedColor::new("papayawhip", 255, 239, 213),
    NamedColor::new("peachpuff", 255, 218, 185),
    NamedColor::new("peru", 205, 133, 63),
    NamedColor::new("plum", 221, 160, 221),
    NamedColor::new("powderblue", 176, 224, 230),
    NamedColor::new("rosybrown", 188, 143, 143),
    NamedColor::new("royalblue", 65, 105, 225),
    NamedColor::new("saddlebrown", 139, 69, 19),
    NamedColor::new("salmon", 250, 128, 114),
    NamedColor::new("sandybrown", 244, 164, 96),
    NamedColor::new("seagreen", 46, 139, 87),
    NamedColor::new("seashell", 255, 245, 238),
    NamedColor::new("sienna", 160, 82, 45),
    NamedColor::new("skyblue", 135, 206, 235),
    NamedColor::new("slateblue", 106, 90, 205),
    NamedColor::new("slategray", 112, 128, 144),
    NamedColor::new("snow", 255, 250, 250),
    NamedColor::new("springgreen", 0, 255, 127),
    NamedColor::new("steelblue", 70, 130, 180),
    NamedColor::new("tan", 210, 180, 140),
    NamedColor::new("thistle", 216, 191, 216),
    NamedColor::new("tomato", 255, 99, 71),
    NamedColor::new("turquoise", 64, 224, 208),
    NamedColor::new("violet", 238, 130, 238),
    NamedColor::new("wheat", 245, 222, 179),
    NamedColor::new("whitesmoke", 245, 245, 245),
    NamedColor::new("yellowgreen", 154, 205, 50),
];

/// Ordered display colors, indexed by class id modulo the palette length.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: &'static [NamedColor],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: &CLASS_COLORS,
        }
    }
}

impl Palette {
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn for_class_id(&self, class_id: i64) -> NamedColor {
        let index = class_id.rem_euclid(self.colors.len() as i64) as usize;
        self.colors[index]
    }

    /// Color for a detection that only carries a class name.
    ///
    /// The hashed value is a color slot, not a category id, and is never used
    /// for label lookup.
    pub fn for_class_name(&self, class_name: &str) -> NamedColor {
        let slot = fnv1a(class_name.as_bytes()) % self.colors.len() as u64;
        self.colors[slot as usize]
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_for_class_id_wraps_around() {
        let palette = Palette::default();

        assert_eq!(palette.len(), 73);
        assert_eq!(palette.for_class_id(0).name, "red");
        assert_eq!(palette.for_class_id(3).name, "yellow");
        assert_eq!(palette.for_class_id(73).name, "red");
        assert_eq!(palette.for_class_id(75).name, "green");
        assert_eq!(palette.for_class_id(-1).name, "yellowgreen");
    }

    #[test]
    fn test_color_is_deterministic() {
        let palette = Palette::default();
        for class_id in 0..200 {
            assert_eq!(
                palette.for_class_id(class_id),
                Palette::default().for_class_id(class_id)
            );
        }
        assert_eq!(palette.for_class_name("dog"), palette.for_class_name("dog"));
    }

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
