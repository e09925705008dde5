use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// X11 keysym value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySym(pub u32);

impl fmt::LowerHex for KeySym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("keysym {0:#x} is not mapped to any keycode")]
    Unmapped(KeySym),
    #[error("key emulation failed: {0}")]
    Backend(String),
}

/// Platform keyboard emulation.
pub trait KeyEmulator: Send + Sync {
    fn press_key(&self, key: KeySym) -> Result<(), KeyError>;
    fn release_key(&self, key: KeySym) -> Result<(), KeyError>;
}

static KEYSYMS: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    let mut table = HashMap::from([
        // modifiers
        ("shift_l", 0xffe1),
        ("shift_r", 0xffe2),
        ("control_l", 0xffe3),
        ("control_r", 0xffe4),
        ("caps_lock", 0xffe5),
        ("meta_l", 0xffe7),
        ("meta_r", 0xffe8),
        ("alt_l", 0xffe9),
        ("alt_r", 0xffea),
        ("super_l", 0xffeb),
        ("super_r", 0xffec),
        ("iso_level3_shift", 0xfe03),
        // editing and navigation
        ("backspace", 0xff08),
        ("tab", 0xff09),
        ("return", 0xff0d),
        ("pause", 0xff13),
        ("scroll_lock", 0xff14),
        ("escape", 0xff1b),
        ("delete", 0xffff),
        ("home", 0xff50),
        ("left", 0xff51),
        ("up", 0xff52),
        ("right", 0xff53),
        ("down", 0xff54),
        ("prior", 0xff55),
        ("next", 0xff56),
        ("end", 0xff57),
        ("print", 0xff61),
        ("insert", 0xff63),
        ("menu", 0xff67),
        ("num_lock", 0xff7f),
        ("space", 0x0020),
        // punctuation
        ("minus", 0x002d),
        ("equal", 0x003d),
        ("plus", 0x002b),
        ("comma", 0x002c),
        ("period", 0x002e),
        ("slash", 0x002f),
        ("semicolon", 0x003b),
        ("apostrophe", 0x0027),
        ("grave", 0x0060),
        ("backslash", 0x005c),
        ("bracketleft", 0x005b),
        ("bracketright", 0x005d),
        // multimedia
        ("xf86audiolowervolume", 0x1008ff11),
        ("xf86audiomute", 0x1008ff12),
        ("xf86audioraisevolume", 0x1008ff13),
        ("xf86audioplay", 0x1008ff14),
        ("xf86audiostop", 0x1008ff15),
        ("xf86audioprev", 0x1008ff16),
        ("xf86audionext", 0x1008ff17),
        ("xf86back", 0x1008ff26),
        ("xf86forward", 0x1008ff27),
        ("xf86reload", 0x1008ff73),
    ]);

    // aliases
    for (alias, target) in [
        ("shift", "shift_l"),
        ("control", "control_l"),
        ("ctrl", "control_l"),
        ("alt", "alt_l"),
        ("meta", "meta_l"),
        ("super", "super_l"),
        ("win", "super_l"),
        ("enter", "return"),
        ("esc", "escape"),
        ("del", "delete"),
        ("ins", "insert"),
        ("pageup", "prior"),
        ("page_up", "prior"),
        ("pgup", "prior"),
        ("pagedown", "next"),
        ("page_down", "next"),
        ("pgdn", "next"),
    ] {
        if let Some(&value) = table.get(target) {
            table.insert(alias, value);
        }
    }

    table
});

/// Resolve a key name like `Control_L`, `ctrl`, `F5` or `t` to its keysym.
///
/// Names are matched case-insensitively except single letters, which keep
/// their case (`T` is the shifted keysym).
pub fn keysym_from_name(name: &str) -> Option<KeySym> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_graphic() {
            return Some(KeySym(ch as u32));
        }
        return None;
    }

    let lower = name.to_ascii_lowercase();
    if let Some(&value) = KEYSYMS.get(lower.as_str()) {
        return Some(KeySym(value));
    }

    // function keys: F1..F35 (XK_F1 = 0xffbe)
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
        if (1..=35).contains(&n) {
            return Some(KeySym(0xffbe + n - 1));
        }
    }

    None
}

/// Keys pressed together, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombination {
    keys: Vec<(String, KeySym)>,
}

impl KeyCombination {
    /// Parse a `+` or whitespace separated list such as `Control+Shift+t`.
    ///
    /// Fails with the first name that has no keysym.
    pub fn parse(spec: &str) -> Result<Self, UnknownKey> {
        let mut keys = Vec::new();
        for part in spec
            .split(|c: char| c == '+' || c.is_whitespace())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let sym = keysym_from_name(part).ok_or_else(|| UnknownKey(part.to_string()))?;
            keys.push((part.to_string(), sym));
        }
        Ok(Self { keys })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn keysyms(&self) -> impl Iterator<Item = KeySym> + '_ {
        self.keys.iter().map(|(_, sym)| *sym)
    }

    /// Press every key down in order, then release them in the same order.
    ///
    /// Stops pressing at the first key the emulator rejects. Every key that
    /// went down is released even when a release fails; the first error is
    /// returned.
    pub fn send(&self, emulator: &dyn KeyEmulator) -> Result<(), KeyError> {
        let mut pressed = 0;
        let mut result = Ok(());
        for &(_, sym) in &self.keys {
            if let Err(err) = emulator.press_key(sym) {
                result = Err(err);
                break;
            }
            pressed += 1;
        }
        for &(_, sym) in &self.keys[..pressed] {
            if let Err(err) = emulator.release_key(sym) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (name, _)) in self.keys.iter().enumerate() {
            if idx > 0 {
                f.write_str("+")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);
