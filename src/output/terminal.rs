//! ANSI colors for terminal output

pub mod colors {
    pub const GREY: u8 = 102;
    pub const AQUA: u8 = 109;
    pub const ORANGE: u8 = 208;
    pub const RED: u8 = 167;
    pub const BLUE: u8 = 68;
    pub const PINK: u8 = 176;
    pub const GREEN: u8 = 71;
    pub const YELLOW: u8 = 185;
}

pub const RESET: &str = "\x1b[0m";

#[inline]
pub fn fg(color: u8) -> String {
    format!("\x1b[38;5;{}m", color)
}

#[inline]
pub fn bold_fg(color: u8) -> String {
    format!("\x1b[1;38;5;{}m", color)
}

/// Applies colors only when enabled, so the same rendering code serves
/// terminals and pipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Colors when stdout is a terminal and `NO_COLOR` is unset
    pub fn for_stdout() -> Self {
        use std::io::IsTerminal;
        Self::new(std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none())
    }

    pub fn for_stderr() -> Self {
        use std::io::IsTerminal;
        Self::new(std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none())
    }

    fn paint(&self, text: &str, code: String) -> String {
        if self.enabled {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(text, bold_fg(colors::GREEN))
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, bold_fg(colors::RED))
    }

    pub fn warning(&self, text: &str) -> String {
        self.paint(text, bold_fg(colors::ORANGE))
    }

    pub fn label(&self, text: &str) -> String {
        self.paint(text, fg(colors::BLUE))
    }

    pub fn key(&self, text: &str) -> String {
        self.paint(text, fg(colors::PINK))
    }

    pub fn value(&self, text: &str) -> String {
        self.paint(text, fg(colors::GREEN))
    }

    pub fn muted(&self, text: &str) -> String {
        self.paint(text, fg(colors::GREY))
    }

    pub fn http_status(&self, code: u16) -> String {
        let color = match code / 100 {
            1 => colors::AQUA,
            2 => colors::GREEN,
            3 => colors::YELLOW,
            4 => colors::ORANGE,
            5 => colors::RED,
            _ => colors::GREY,
        };
        self.paint(&code.to_string(), bold_fg(color))
    }

    pub fn http_method(&self, method: &str) -> String {
        let color = match method.to_uppercase().as_str() {
            "GET" | "HEAD" | "OPTIONS" => colors::GREEN,
            "POST" => colors::YELLOW,
            "PUT" | "PATCH" => colors::ORANGE,
            "DELETE" => colors::RED,
            _ => colors::GREY,
        };
        self.paint(method, bold_fg(color))
    }
}
