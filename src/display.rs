use std::fmt::{self, Display};

use crate::arch::Gcc;
use crate::emit::AsmBlock;

/// Renders an [AsmBlock] as a GCC extended assembly statement.
///
/// ```text
/// asm("mv x1,%0" :: "r" (color) : "x1");
/// ```
pub struct GccStatement<'a>(pub &'a AsmBlock);

impl Display for GccStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let block = self.0;
        let lines = block.template::<Gcc>();

        write!(f, "asm(")?;
        if lines.is_empty() {
            write!(f, "\"\"")?;
        }
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            let newline = if i + 1 < lines.len() { "\\n" } else { "" };
            write!(f, "\"{}{newline}\"", escape(line))?;
        }

        let sections = [
            block
                .outputs
                .iter()
                .map(|expr| format!("\"=r\" ({expr})"))
                .collect::<Vec<_>>(),
            block
                .inputs
                .iter()
                .map(|expr| format!("\"r\" ({expr})"))
                .collect::<Vec<_>>(),
            block
                .clobbers
                .iter()
                .map(|clobber| format!("\"{}\"", clobber.name()))
                .collect::<Vec<_>>(),
        ];

        // Trailing empty sections are omitted entirely
        let used = sections
            .iter()
            .rposition(|section| !section.is_empty())
            .map_or(0, |last| last + 1);
        for i in 0..used {
            if i == 0 || !sections[i - 1].is_empty() {
                write!(f, " ")?;
            }
            write!(f, ":")?;
            if !sections[i].is_empty() {
                write!(f, " {}", sections[i].join(", "))?;
            }
        }

        write!(f, ");")
    }
}

fn escape(line: &str) -> String {
    line.replace('\\', "\\\\").replace('"', "\\\"")
}

// ————————————————————————————————— Tests —————————————————————————————————— //
