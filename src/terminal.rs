//! Line-oriented front end: one command per line in, rendered view out.

use std::fmt::Write as _;
use std::str::FromStr;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::clients::PosClient;
use crate::domain::{PaymentMethod, ProductId};
use crate::error::PosError;
use crate::view::PosView;

const HELP: &str = "\
commands:
  list                 show products and cart
  add <id>             add one unit to the cart
  remove <id>          remove one unit from the cart
  clear                empty the cart
  refresh              reload the catalog
  filter [category]    show one category (no argument shows all)
  pay                  open payment
  method cash|qris     choose the payment method
  tender <amount>      cash handed over
  confirm              submit the order
  close                close payment
  quit                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Add(ProductId),
    Remove(ProductId),
    Clear,
    Refresh,
    Filter(Option<String>),
    Pay,
    Method(PaymentMethod),
    Tender(String),
    Confirm,
    Close,
    Help,
    Quit,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("Invalid argument for `{command}`: {reason}")]
    InvalidArgument { command: &'static str, reason: String },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let argument = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(rest)
            }
        };
        let product_id = |name: &'static str| -> Result<ProductId, CommandError> {
            argument(name)?
                .parse()
                .map_err(|e: std::num::ParseIntError| CommandError::InvalidArgument {
                    command: name,
                    reason: e.to_string(),
                })
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "list" | "ls" => Ok(Command::List),
            "add" | "+" => Ok(Command::Add(product_id("add")?)),
            "remove" | "rm" | "-" => Ok(Command::Remove(product_id("remove")?)),
            "clear" => Ok(Command::Clear),
            "refresh" => Ok(Command::Refresh),
            "filter" => Ok(Command::Filter((!rest.is_empty()).then(|| rest.to_string()))),
            "pay" => Ok(Command::Pay),
            "method" => argument("method")?
                .parse()
                .map(Command::Method)
                .map_err(|reason| CommandError::InvalidArgument {
                    command: "method",
                    reason,
                }),
            "tender" => Ok(Command::Tender(argument("tender")?.to_string())),
            "confirm" => Ok(Command::Confirm),
            "close" => Ok(Command::Close),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Reads commands until `quit` or end of input, printing the view after
/// each command and every notification as it arrives.
pub async fn run<R, W>(client: &PosClient, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // Raw segments so a stray non-UTF-8 byte is a bad command, not an I/O error.
    let mut lines = input.split(b'\n');
    let mut notifications = client.subscribe_notifications();

    output.write_all(HELP.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;

    loop {
        tokio::select! {
            segment = lines.next_segment() => {
                let Some(segment) = segment? else {
                    info!("Input closed");
                    break;
                };
                let line = String::from_utf8_lossy(&segment);
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        output.write_all(format!("{}\n", e).as_bytes()).await?;
                        output.flush().await?;
                        continue;
                    }
                };
                if command == Command::Quit {
                    break;
                }
                let text = match execute(client, command).await {
                    Ok(Some(text)) => text,
                    Ok(None) => render_text(&client.current_view()),
                    Err(e) => format!("error: {}\n", e),
                };
                output.write_all(text.as_bytes()).await?;
                output.flush().await?;
            }
            notification = notifications.recv() => {
                match notification {
                    Ok(notification) => {
                        output.write_all(format!("{}\n", notification).as_bytes()).await?;
                        output.flush().await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Dropped notifications");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    Ok(())
}

/// Runs one command; `Some` is text to print instead of the view.
async fn execute(client: &PosClient, command: Command) -> Result<Option<String>, PosError> {
    debug!(command = ?command, "Executing");
    match command {
        Command::List | Command::Quit => {}
        Command::Help => return Ok(Some(format!("{}\n", HELP))),
        Command::Add(id) => {
            client.add_to_cart(id).await?;
        }
        Command::Remove(id) => {
            client.remove_from_cart(id).await?;
        }
        Command::Clear => client.clear_cart().await?,
        Command::Refresh => client.refresh_catalog().await?,
        Command::Filter(category) => client.set_category_filter(category).await?,
        Command::Pay => {
            client.open_payment().await?;
        }
        Command::Method(method) => client.select_payment_method(method).await?,
        Command::Tender(amount) => {
            client.enter_tendered(amount).await?;
        }
        Command::Confirm => {
            client.confirm_payment().await?;
        }
        Command::Close => client.close_payment().await?,
    }
    Ok(None)
}

/// Plain-text rendering of the view model.
pub fn render_text(view: &PosView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "== Products ==");
    if !view.catalog_loaded {
        let _ = writeln!(out, "Loading products...");
    }
    if !view.categories.is_empty() {
        let _ = writeln!(
            out,
            "categories: {} (showing: {})",
            view.categories.join(", "),
            view.category_filter.as_deref().unwrap_or("all")
        );
    }
    for tile in &view.grid {
        let badge = tile.badge.map(|qty| format!(" [{} in cart]", qty)).unwrap_or_default();
        let stock = tile.stock.label().map(|label| format!(" ({})", label)).unwrap_or_default();
        let _ = writeln!(out, "{:>4}  {:<24} {:>14}{}{}", tile.id, tile.name, tile.price_label, stock, badge);
    }

    let _ = writeln!(out, "== Cart ==");
    match view.cart.empty_message {
        Some(message) => {
            let _ = writeln!(out, "{}", message);
        }
        None => {
            for row in &view.cart.rows {
                let _ = writeln!(out, "{:>4}  {:<24} {:<20} {:>14}", row.product_id, row.name, row.unit_label, row.line_total_label);
            }
        }
    }
    let _ = writeln!(out, "Subtotal {:>14}", view.cart.subtotal_label);
    let _ = writeln!(out, "Tax      {:>14}", view.cart.tax_label);
    let _ = writeln!(out, "Total    {:>14}", view.cart.total_label);

    if let Some(modal) = &view.payment {
        let _ = writeln!(out, "== Payment ({}) ==", modal.method);
        let _ = writeln!(out, "Due      {:>14}", modal.total_label);
        if let Some(change) = &modal.change_label {
            let _ = writeln!(out, "Tendered {:>14}", modal.tendered_input);
            let _ = writeln!(out, "Change   {:>14}", change);
        }
        if let Some(reason) = &modal.rejection {
            let _ = writeln!(out, "Last attempt failed: {}", reason);
        }
        let state = if modal.confirm_enabled { "ready" } else { "disabled" };
        let _ = writeln!(out, "[{}] ({})", modal.confirm_label, state);
    }
    if let Some(code) = &view.last_transaction_code {
        let _ = writeln!(out, "Last order: {}", code);
    }
    out
}
