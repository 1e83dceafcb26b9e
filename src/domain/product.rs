/// Buildable products: embedded art + colors + achievement badge.
///
/// Art files live in `assets/art/` and are compiled in with `include_str!`.
/// Each product maps specific characters to colors; everything else gets
/// the product's default color.

use crossterm::style::Color;

use crate::domain::art::ArtGrid;
use crate::domain::cell::Cell;
use crate::error::ForgeResult;

const TOMATO_ART: &str = include_str!("../../assets/art/tomato.txt");
const COFFEE_ART: &str = include_str!("../../assets/art/coffee.txt");
const PENGUIN_ART: &str = include_str!("../../assets/art/penguin.txt");

#[derive(Clone, Debug)]
pub struct Product {
    pub name: String,
    pub art: ArtGrid,
    /// Single-width glyph shown once per completed build.
    pub badge: Cell,
}

struct ProductDef {
    name: &'static str,
    text: &'static str,
    palette: &'static [(char, Color)],
    default: Color,
    badge: (char, Color),
}

const PRODUCTS: &[ProductDef] = &[
    ProductDef {
        name: "Tomato",
        text: TOMATO_ART,
        palette: &[('|', Color::Green), ('/', Color::Green), ('\\', Color::Green)],
        default: Color::Red,
        badge: ('●', Color::Red),
    },
    ProductDef {
        name: "Coffee Cup",
        text: COFFEE_ART,
        palette: &[
            ('|', Color::Yellow),
            ('_', Color::Yellow),
            ('-', Color::Yellow),
            ('=', Color::Yellow),
            ('~', Color::White),
        ],
        default: Color::DarkYellow,
        badge: ('■', Color::DarkYellow),
    },
    ProductDef {
        name: "Penguin",
        text: PENGUIN_ART,
        palette: &[
            ('|', Color::Cyan),
            ('/', Color::Cyan),
            ('\\', Color::Cyan),
            ('_', Color::Cyan),
            ('^', Color::Cyan),
            ('o', Color::White),
        ],
        default: Color::DarkGrey,
        badge: ('▲', Color::Cyan),
    },
];

/// Load the built-in product list. Fails on malformed art.
pub fn builtin() -> ForgeResult<Vec<Product>> {
    PRODUCTS
        .iter()
        .map(|def| {
            Ok(Product {
                name: def.name.to_string(),
                art: ArtGrid::from_text(def.name, def.text, def.palette, def.default)?,
                badge: Cell::fg(def.badge.0, def.badge.1),
            })
        })
        .collect()
}
