//! Terminal chat front end for IRIS
//!
//! Prints the banner, checks that the chat service is up, then reads one
//! line at a time. Plain lines are sent as questions and the answer is
//! rendered while it streams in; lines starting with `/` are commands.

use iris_core::{
    all_roles, ensure_available, find_role, get_department_for_role, run_exchange, AppSettings,
    ChatBackend, ExchangeUpdate, IrisError, Layout, Result, SessionState, Speaker,
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Shown while waiting for the first delta
pub const THINKING_PLACEHOLDER: &str = "🤔 IRIS is thinking...";

const WIDE_WIDTH: usize = 78;
const CENTERED_WIDTH: usize = 60;

#[derive(Clone, Debug)]
pub struct TerminalConfig {
    pub app: AppSettings,
    /// Redraw the placeholder line in place with ANSI escapes
    pub ansi: bool,
}

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    SwitchRole(String),
    ListRoles,
    History,
    Reset,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if !line.starts_with('/') {
            return Command::Ask(line.to_string());
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();
        match name {
            "/role" if !arg.is_empty() => Command::SwitchRole(arg.to_string()),
            "/role" | "/roles" => Command::ListRoles,
            "/history" => Command::History,
            "/reset" => Command::Reset,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

pub struct TerminalChat {
    pub config: TerminalConfig,
    backend: Arc<dyn ChatBackend>,
    session: SessionState,
}

impl TerminalChat {
    pub fn new(config: TerminalConfig, backend: Arc<dyn ChatBackend>, session: SessionState) -> Self {
        Self {
            config,
            backend,
            session,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Run until `/quit` or end of input
    ///
    /// Fails without reading any input when the service is unavailable.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        self.print_banner(out)?;

        if let Err(e) = ensure_available(self.backend.as_ref()).await {
            writeln!(out, "⚠️ {}", e)?;
            return Err(e);
        }

        self.print_role(out)?;
        self.print_history(out)?;

        let mut lines = input.lines();
        loop {
            write!(out, "{}> ", self.margin())?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                break;
            };

            match Command::parse(&line) {
                Command::Empty => {}
                Command::Ask(question) => self.ask(&question, out).await?,
                Command::SwitchRole(role) => self.switch_role(&role, out)?,
                Command::ListRoles => self.print_roles(out)?,
                Command::History => self.print_history(out)?,
                Command::Reset => {
                    self.session.reset_turns();
                    tracing::info!(target: "app", "Transcript cleared by user");
                    writeln!(out, "{}Conversation cleared.", self.margin())?;
                }
                Command::Help => self.print_help(out)?,
                Command::Quit => break,
                Command::Unknown(name) => {
                    writeln!(out, "{}Unknown command {} (try /help)", self.margin(), name)?;
                }
            }
        }

        tracing::info!(target: "app", "Chat session ended");
        Ok(())
    }

    async fn ask<W: Write>(&mut self, question: &str, out: &mut W) -> Result<()> {
        let margin = self.margin();
        let ansi = self.config.ansi;
        let mut rendered = 0usize;

        writeln!(out, "{}IRIS:", margin)?;
        let result = run_exchange(self.backend.as_ref(), &mut self.session, question, |update| {
            match update {
                ExchangeUpdate::Thinking => {
                    let _ = write!(out, "{}{}", margin, THINKING_PLACEHOLDER);
                    if !ansi {
                        let _ = writeln!(out);
                    }
                }
                ExchangeUpdate::Partial(text) => {
                    if rendered == 0 {
                        if ansi {
                            let _ = write!(out, "\r\x1b[2K");
                        }
                        let _ = write!(out, "{}", margin);
                    }
                    // Each update extends the previous one; print only the new tail.
                    let _ = write!(out, "{}", &text[rendered..]);
                    rendered = text.len();
                }
            }
            let _ = out.flush();
        })
        .await;

        match result {
            Ok(answer) => {
                if answer.is_empty() && ansi {
                    write!(out, "\r\x1b[2K")?;
                }
                writeln!(out)?;
                Ok(())
            }
            Err(e) if e.is_transport() => {
                if rendered > 0 || ansi {
                    writeln!(out)?;
                }
                writeln!(out, "{}⚠️ Error: {}", margin, e)?;
                Ok(())
            }
            Err(IrisError::Validation(msg)) => {
                writeln!(out, "{}{}", margin, msg)?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn switch_role<W: Write>(&mut self, role: &str, out: &mut W) -> Result<()> {
        match self.session.select_role(role) {
            Ok(cleared) => {
                if cleared {
                    writeln!(out, "{}Conversation cleared for the new role.", self.margin())?;
                }
                self.print_role(out)
            }
            Err(IrisError::Validation(msg)) => {
                writeln!(out, "{}{} (see /roles)", self.margin(), msg)?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn margin(&self) -> &'static str {
        match self.config.app.layout {
            Layout::Wide => "",
            Layout::Centered => "         ",
        }
    }

    fn width(&self) -> usize {
        match self.config.app.layout {
            Layout::Wide => WIDE_WIDTH,
            Layout::Centered => CENTERED_WIDTH,
        }
    }

    fn print_banner<W: Write>(&self, out: &mut W) -> Result<()> {
        let margin = self.margin();
        let width = self.width();
        let title = format!("{} {}", self.config.app.icon, self.config.app.title);
        let pad = match self.config.app.layout {
            Layout::Wide => 0,
            Layout::Centered => width.saturating_sub(title.chars().count()) / 2,
        };

        writeln!(out, "{}{}", margin, "=".repeat(width))?;
        writeln!(out, "{}{}{}", margin, " ".repeat(pad), title)?;
        writeln!(out, "{}{}", margin, "-".repeat(width))?;
        Ok(())
    }

    fn print_role<W: Write>(&self, out: &mut W) -> Result<()> {
        let id = self.session.role();
        let name = find_role(id).map(|r| r.display_name).unwrap_or(id);
        writeln!(
            out,
            "{}Role: {} ({}), department: {}",
            self.margin(),
            name,
            id,
            get_department_for_role(id)
        )?;
        Ok(())
    }

    fn print_roles<W: Write>(&self, out: &mut W) -> Result<()> {
        for role in all_roles() {
            let marker = if role.id == self.session.role() { "*" } else { " " };
            writeln!(
                out,
                "{}{} {:<20} {:<22} {}",
                self.margin(),
                marker,
                role.id,
                role.display_name,
                get_department_for_role(role.id)
            )?;
        }
        Ok(())
    }

    fn print_history<W: Write>(&self, out: &mut W) -> Result<()> {
        for turn in self.session.turns() {
            let label = match turn.speaker {
                Speaker::User => "You",
                Speaker::Assistant => "IRIS",
            };
            writeln!(out, "{}{}: {}", self.margin(), label, turn.text)?;
        }
        Ok(())
    }

    fn print_help<W: Write>(&self, out: &mut W) -> Result<()> {
        let margin = self.margin();
        writeln!(out, "{}/role <id>   switch role", margin)?;
        writeln!(out, "{}/roles       list roles", margin)?;
        writeln!(out, "{}/history     show the conversation", margin)?;
        writeln!(out, "{}/reset       clear the conversation", margin)?;
        writeln!(out, "{}/quit        leave", margin)?;
        Ok(())
    }
}
