// crates/cli/src/pager.rs
//! Interactive paging over a [`DataTable`].

use std::io::Write;

use datadesk_core::DataTable;
use tokio::io::{AsyncBufRead, Lines};

const HELP: &str = "[Enter/n] próxima  [p] anterior  [f] primeira  [l] última  [número] ir para  [q] sair";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerCommand {
    Next,
    Previous,
    First,
    Last,
    GoTo(usize),
    Quit,
}

impl PagerCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" | "n" | "next" => Some(Self::Next),
            "p" | "prev" | "previous" => Some(Self::Previous),
            "f" | "first" => Some(Self::First),
            "l" | "last" => Some(Self::Last),
            "q" | "quit" => Some(Self::Quit),
            _ => line.parse().ok().map(Self::GoTo),
        }
    }

    /// Move the cursor. `false` when the page did not change.
    pub fn apply(self, table: &mut DataTable) -> bool {
        match self {
            Self::Next => table.next(),
            Self::Previous => table.previous(),
            Self::First => table.first(),
            Self::Last => table.last(),
            Self::GoTo(page) => table.go_to(page),
            Self::Quit => false,
        }
    }
}

/// Render the table, then keep paging until `q` or end of input.
/// Single-page tables are printed once without prompting.
pub async fn browse<R, W>(table: &mut DataTable, input: &mut Lines<R>, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{}", table.render())?;
    if !table.has_pagination() {
        return Ok(());
    }

    loop {
        write!(out, "{HELP}\n> ")?;
        out.flush()?;
        let Some(line) = input.next_line().await? else {
            break;
        };
        match PagerCommand::parse(&line) {
            Some(PagerCommand::Quit) => break,
            Some(cmd) => {
                if cmd.apply(table) {
                    writeln!(out, "{}", table.render())?;
                } else {
                    writeln!(
                        out,
                        "Página {} de {}, comando sem efeito.",
                        table.current_page(),
                        table.total_pages()
                    )?;
                }
            }
            None => writeln!(out, "Comando desconhecido: {}", line.trim())?,
        }
    }
    Ok(())
}
