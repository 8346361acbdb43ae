//! Static dashboard content and its text rendering.

use std::io::{self, Write};

/// Card emphasis, mirrored as a marker in the text rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardVariant {
    Default,
    Primary,
    Secondary,
}

impl CardVariant {
    fn marker(&self) -> &'static str {
        match self {
            CardVariant::Default => " ",
            CardVariant::Primary => "*",
            CardVariant::Secondary => "+",
        }
    }
}

/// A health topic card. Selecting any card opens the chat panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthTopic {
    pub title: &'static str,
    pub description: &'static str,
    pub variant: CardVariant,
}

/// A quick-help shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickHelp {
    pub label: &'static str,
    pub detail: &'static str,
}

pub const TITLE: &str = "Health Assistant";
pub const TAGLINE: &str = "AI-powered healthcare for rural and semi-urban areas";
pub const SUBTITLE: &str = "Your Trusted Health Companion";
pub const DISCLAIMER: &str =
    "This information is for educational purposes only. For serious health issues, please consult a doctor.";
pub const LANGUAGE_HINT: &str = "Speak in Hindi, English, or your local language";

pub const TOPICS: [HealthTopic; 4] = [
    HealthTopic {
        title: "Vaccination Schedule",
        description: "Get information about essential vaccines for children and adults",
        variant: CardVariant::Primary,
    },
    HealthTopic {
        title: "Common Diseases",
        description: "Learn about symptoms and treatments for fever, cough, stomach pain and more",
        variant: CardVariant::Secondary,
    },
    HealthTopic {
        title: "Prevention Tips",
        description: "Daily suggestions for staying healthy and preventing diseases",
        variant: CardVariant::Default,
    },
    HealthTopic {
        title: "Emergency Help",
        description: "Recognize serious symptoms and know what to do immediately",
        variant: CardVariant::Default,
    },
];

pub const LANGUAGES: [&str; 8] = [
    "हिंदी", "English", "বাংলা", "தமிழ்", "తెలుగు", "ગુજરાતી", "ಕನ್ನಡ", "മലയാളം",
];

pub const QUICK_HELP: [QuickHelp; 3] = [
    QuickHelp {
        label: "Emergency Numbers",
        detail: "108 / 102",
    },
    QuickHelp {
        label: "Health Check",
        detail: "Symptom Checker",
    },
    QuickHelp {
        label: "Nearest Center",
        detail: "Health Services",
    },
];

/// Resolve a 1-based topic number typed by the user.
pub fn topic_by_number(input: &str) -> Option<&'static HealthTopic> {
    let n: usize = input.trim().parse().ok()?;
    n.checked_sub(1).and_then(|i| TOPICS.get(i))
}

/// Write the dashboard view.
pub fn render<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "==== {} ====", TITLE)?;
    writeln!(out, "{}", TAGLINE)?;
    writeln!(out)?;
    writeln!(out, "Language Support: {}", LANGUAGES.join(" · "))?;
    writeln!(out)?;
    writeln!(out, "Health topics:")?;
    for (i, topic) in TOPICS.iter().enumerate() {
        writeln!(out, " {}{}. {}", topic.variant.marker(), i + 1, topic.title)?;
        writeln!(out, "      {}", topic.description)?;
    }
    writeln!(out)?;
    writeln!(out, "Quick Help:")?;
    for help in QUICK_HELP.iter() {
        writeln!(out, "  - {} ({})", help.label, help.detail)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", DISCLAIMER)?;
    writeln!(
        out,
        "Type a topic number or 'chat' to start chatting, 'quit' to exit."
    )?;
    Ok(())
}
