//! Color token resolution.
//!
//! Tokens resolve against two single-letter palettes first. Anything else is
//! taken as a raw CSS color, with bare hex digits gaining a `#`. No token is
//! rejected.

use std::sync::LazyLock;

use regex_lite::Regex;
use smol_str::{SmolStr, format_smolstr};

use crate::markup::AnnotationKind;

/// Class carried by every generated span.
pub const BASE_CLASS: &str = "ls-custom-color";

/// Extra class carried by background-mode spans.
pub const BACKGROUND_MODE_CLASS: &str = "ls-color-bg-mode";

/// Foreground palette: mnemonic letter to style class.
const TEXT_PALETTE: [(&str, &str); 10] = [
    ("r", "ls-text-r"),
    ("o", "ls-text-o"),
    ("y", "ls-text-y"),
    ("g", "ls-text-g"),
    ("t", "ls-text-t"),
    ("s", "ls-text-s"),
    ("b", "ls-text-b"),
    ("p", "ls-text-p"),
    ("i", "ls-text-i"),
    ("a", "ls-text-a"),
];

/// Background palette. Has one more entry (`k`) than the foreground one.
const BACKGROUND_PALETTE: [(&str, &str); 11] = [
    ("r", "ls-bg-r"),
    ("o", "ls-bg-o"),
    ("y", "ls-bg-y"),
    ("g", "ls-bg-g"),
    ("t", "ls-bg-t"),
    ("s", "ls-bg-s"),
    ("b", "ls-bg-b"),
    ("p", "ls-bg-p"),
    ("i", "ls-bg-i"),
    ("a", "ls-bg-a"),
    ("k", "ls-bg-k"),
];

static TAG_FRAGMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static BARE_HEX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{3,6}$").unwrap());

/// Which CSS property a raw color lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Foreground,
    Background,
}

/// Resolved styling instruction for one annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorDirective {
    /// Named palette hit.
    Class(SmolStr),
    /// Raw CSS color value, applied with `!important`.
    Raw { color: SmolStr, mode: ColorMode },
}

/// One inline CSS declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDeclaration {
    pub property: SmolStr,
    pub value: SmolStr,
    pub important: bool,
}

impl StyleDeclaration {
    fn important(property: &str, value: impl Into<SmolStr>) -> Self {
        Self {
            property: SmolStr::new(property),
            value: value.into(),
            important: true,
        }
    }
}

/// Classes and inline declarations for one generated span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpanStyle {
    pub classes: Vec<SmolStr>,
    pub declarations: Vec<StyleDeclaration>,
}

impl SpanStyle {
    /// Space-separated `class` attribute value.
    pub fn class_attr(&self) -> String {
        self.classes.join(" ")
    }

    /// Inline `style` attribute value, or `None` when there are no declarations.
    pub fn style_attr(&self) -> Option<String> {
        if self.declarations.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .declarations
            .iter()
            .map(|d| {
                if d.important {
                    format!("{}: {} !important", d.property, d.value)
                } else {
                    format!("{}: {}", d.property, d.value)
                }
            })
            .collect();
        Some(parts.join("; "))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Value of a declared property, if any.
    pub fn property(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }
}

/// Remove tag-like `<...>` fragments and surrounding whitespace from a token.
///
/// Pasted rich text can leave markup inside the color token.
pub fn strip_markup(token: &str) -> SmolStr {
    SmolStr::new(TAG_FRAGMENT_REGEX.replace_all(token, "").trim())
}

/// Resolve a color token for the given annotation kind.
pub fn resolve_color(token: &str, kind: AnnotationKind) -> ColorDirective {
    let color = strip_markup(token);

    let palette: &[(&'static str, &'static str)] = match kind {
        AnnotationKind::Text => &TEXT_PALETTE,
        AnnotationKind::Background => &BACKGROUND_PALETTE,
    };
    if let Some((_, class)) = palette.iter().find(|(key, _)| *key == color) {
        return ColorDirective::Class(SmolStr::new(class));
    }

    let color = if BARE_HEX_REGEX.is_match(&color) {
        format_smolstr!("#{}", color)
    } else {
        color
    };
    let mode = match kind {
        AnnotationKind::Text => ColorMode::Foreground,
        AnnotationKind::Background => ColorMode::Background,
    };
    ColorDirective::Raw { color, mode }
}

/// Render a directive into the classes and declarations a span carries.
pub fn span_style(kind: AnnotationKind, directive: &ColorDirective) -> SpanStyle {
    let mut style = SpanStyle {
        classes: vec![SmolStr::new_static(BASE_CLASS)],
        declarations: Vec::new(),
    };
    if kind == AnnotationKind::Background {
        style
            .classes
            .push(SmolStr::new_static(BACKGROUND_MODE_CLASS));
    }

    match directive {
        ColorDirective::Class(class) => style.classes.push(class.clone()),
        ColorDirective::Raw {
            color,
            mode: ColorMode::Foreground,
        } => {
            style
                .declarations
                .push(StyleDeclaration::important("color", color.clone()));
        }
        ColorDirective::Raw {
            color,
            mode: ColorMode::Background,
        } => {
            style.declarations.push(StyleDeclaration::important(
                "background-color",
                color.clone(),
            ));
            // White text keeps arbitrary backgrounds legible.
            style
                .declarations
                .push(StyleDeclaration::important("color", "white"));
        }
    }
    style
}
