//! TeX-subset label typesetting.
//!
//! Figure labels are written the way a paper would write them
//! (`$\boldsymbol{\delta_{max}}$`, `$\dot{L}$`). The bitmap backend has no
//! math layout engine, so labels are flattened to Unicode:
//!
//! - `$` delimiters are dropped
//! - font wrappers (`\boldsymbol`, `\mathbf`, `\text`, ...) keep their content
//! - Greek macros map to their code points
//! - accents (`\dot`, `\hat`, ...) become combining marks
//! - `_{..}` / `^{..}` use Unicode sub/superscripts when every character has
//!   one, otherwise they stay as `_..` / `^..`

use std::iter::Peekable;
use std::str::Chars;

/// Flatten a label for display. With `use_math` off the label is returned
/// verbatim.
pub fn typeset(label: &str, use_math: bool) -> String {
    if !use_math {
        return label.to_string();
    }
    let stripped: String = label.chars().filter(|c| *c != '$').collect();
    let mut chars = stripped.chars().peekable();
    render_until(&mut chars, None)
}

fn render_until(chars: &mut Peekable<Chars<'_>>, close: Option<char>) -> String {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        if Some(c) == close {
            return out;
        }
        match c {
            '{' => out.push_str(&render_until(chars, Some('}'))),
            '\\' => out.push_str(&render_macro(chars)),
            '_' => out.push_str(&script(&group(chars), subscript, '_')),
            '^' => out.push_str(&script(&group(chars), superscript, '^')),
            c => out.push(c),
        }
    }
    out
}

/// Argument of a macro or script: a braced group, a macro, or one char.
fn group(chars: &mut Peekable<Chars<'_>>) -> String {
    while chars.peek() == Some(&' ') {
        chars.next();
    }
    match chars.next() {
        Some('{') => render_until(chars, Some('}')),
        Some('\\') => render_macro(chars),
        Some(c) => c.to_string(),
        None => String::new(),
    }
}

fn render_macro(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_alphabetic() {
            break;
        }
        name.push(c);
        chars.next();
    }

    // Escaped symbol such as `\{` or `\%`.
    if name.is_empty() {
        return chars.next().map(String::from).unwrap_or_default();
    }

    // A space after a control word only terminates it.
    if chars.peek() == Some(&' ') {
        chars.next();
    }

    if let Some(g) = greek(&name) {
        return g.to_string();
    }

    match name.as_str() {
        "boldsymbol" | "mathbf" | "bm" | "mathrm" | "mathit" | "mathsf" | "text" | "textbf"
        | "textit" => group(chars),
        "dot" => accent(group(chars), '\u{0307}'),
        "ddot" => accent(group(chars), '\u{0308}'),
        "hat" => accent(group(chars), '\u{0302}'),
        "bar" => accent(group(chars), '\u{0304}'),
        "tilde" => accent(group(chars), '\u{0303}'),
        "vec" => accent(group(chars), '\u{20D7}'),
        "cdot" => "·".to_string(),
        "times" => "×".to_string(),
        "pm" => "±".to_string(),
        "infty" => "∞".to_string(),
        "leq" | "le" => "≤".to_string(),
        "geq" | "ge" => "≥".to_string(),
        "to" | "rightarrow" => "→".to_string(),
        _ => name,
    }
}

fn accent(mut base: String, mark: char) -> String {
    base.push(mark);
    base
}

fn script(content: &str, map: fn(char) -> Option<char>, marker: char) -> String {
    match content.chars().map(map).collect::<Option<String>>() {
        Some(s) if !s.is_empty() => s,
        _ => format!("{marker}{content}"),
    }
}

fn greek(name: &str) -> Option<&'static str> {
    Some(match name {
        "alpha" => "α",
        "beta" => "β",
        "gamma" => "γ",
        "delta" => "δ",
        "epsilon" => "ϵ",
        "varepsilon" => "ε",
        "zeta" => "ζ",
        "eta" => "η",
        "theta" => "θ",
        "vartheta" => "ϑ",
        "iota" => "ι",
        "kappa" => "κ",
        "lambda" => "λ",
        "mu" => "μ",
        "nu" => "ν",
        "xi" => "ξ",
        "pi" => "π",
        "rho" => "ρ",
        "sigma" => "σ",
        "tau" => "τ",
        "upsilon" => "υ",
        "phi" => "ϕ",
        "varphi" => "φ",
        "chi" => "χ",
        "psi" => "ψ",
        "omega" => "ω",
        "Gamma" => "Γ",
        "Delta" => "Δ",
        "Theta" => "Θ",
        "Lambda" => "Λ",
        "Xi" => "Ξ",
        "Pi" => "Π",
        "Sigma" => "Σ",
        "Phi" => "Φ",
        "Psi" => "Ψ",
        "Omega" => "Ω",
        _ => return None,
    })
}

fn subscript(c: char) -> Option<char> {
    Some(match c {
        '0'..='9' => char::from_u32(0x2080 + (c as u32 - '0' as u32))?,
        '+' => '₊',
        '-' => '₋',
        '=' => '₌',
        '(' => '₍',
        ')' => '₎',
        'a' => 'ₐ',
        'e' => 'ₑ',
        'h' => 'ₕ',
        'i' => 'ᵢ',
        'j' => 'ⱼ',
        'k' => 'ₖ',
        'l' => 'ₗ',
        'm' => 'ₘ',
        'n' => 'ₙ',
        'o' => 'ₒ',
        'p' => 'ₚ',
        'r' => 'ᵣ',
        's' => 'ₛ',
        't' => 'ₜ',
        'u' => 'ᵤ',
        'v' => 'ᵥ',
        'x' => 'ₓ',
        _ => return None,
    })
}

fn superscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4'..='9' => char::from_u32(0x2074 + (c as u32 - '4' as u32))?,
        '+' => '⁺',
        '-' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'i' => 'ⁱ',
        'n' => 'ⁿ',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_without_math() {
        assert_eq!(typeset(r"$\delta_{min}$", false), r"$\delta_{min}$");
    }

    #[test]
    fn test_bold_greek_with_subscript() {
        assert_eq!(typeset(r"$\boldsymbol{\delta_{max}}$", true), "δₘₐₓ");
        assert_eq!(typeset(r"$\boldsymbol{\varepsilon_{min}}$", true), "εₘᵢₙ");
        assert_eq!(typeset(r"$\varepsilon_{step}$", true), "εₛₜₑₚ");
    }

    #[test]
    fn test_control_word_space() {
        assert_eq!(typeset(r"$\Delta \delta$", true), "Δδ");
    }

    #[test]
    fn test_accent_and_single_char_script() {
        assert_eq!(typeset(r"$\dot{L}$", true), "L\u{0307}");
        assert_eq!(typeset(r"$L_t$", true), "Lₜ");
        assert_eq!(typeset(r"$x^2$", true), "x²");
    }

    #[test]
    fn test_script_fallback() {
        assert_eq!(typeset(r"$x_{Q}$", true), "x_Q");
        assert_eq!(typeset(r"$x^{ab}$", true), "x^ab");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(typeset("Step", true), "Step");
        assert_eq!(typeset(r"50\% done", true), "50% done");
    }
}
