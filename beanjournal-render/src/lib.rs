//! Canonical text rendering for journal directives.
//!
//! Every write path goes through this crate, so text produced by the program
//! is indistinguishable from text typed by hand: two-space indentation for
//! postings and directive metadata, four spaces for posting metadata, amounts
//! printed with whatever scale their decimal carries.

use std::io::Write;

use thiserror::Error;

use beanjournal_core::{
    Balance, Close, Commodity, CostSpec, Directive, Ledger, Meta, Note, Open, Pad, Posting,
    Transaction,
};

#[cfg(test)]
mod tests;

#[derive(Debug, Error)]
pub enum BasicRendererError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("rendered text was not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Renders a value of type `T` into a writer.
pub trait Renderer<T, W: Write> {
    type Error;

    fn render(&self, renderable: T, write: &mut W) -> Result<(), Self::Error>;
}

/// The one true renderer. Stateless; formatting decisions live in the
/// directive-specific impls below.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicRenderer;

/// Renders a whole ledger with `render`, a blank line between directives.
pub fn render<W: Write>(ledger: &Ledger, write: &mut W) -> Result<(), BasicRendererError> {
    BasicRenderer.render(ledger, write)
}

/// Renders one directive to a string, without a trailing newline on the last
/// line.
pub fn render_directive(directive: &Directive) -> Result<String, BasicRendererError> {
    let mut buf = Vec::new();
    BasicRenderer.render(directive, &mut buf)?;
    let mut text = String::from_utf8(buf)?;
    while text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Renders one directive as a vector of lines, ready to splice into a file.
pub fn directive_lines(directive: &Directive) -> Result<Vec<String>, BasicRendererError> {
    Ok(render_directive(directive)?
        .split('\n')
        .map(str::to_string)
        .collect())
}

impl<W: Write> Renderer<&Ledger, W> for BasicRenderer {
    type Error = BasicRendererError;

    fn render(&self, ledger: &Ledger, write: &mut W) -> Result<(), Self::Error> {
        let mut first = true;
        for directive in &ledger.directives {
            if !first {
                writeln!(write)?;
            }
            first = false;
            self.render(directive, write)?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer<&Directive, W> for BasicRenderer {
    type Error = BasicRendererError;

    fn render(&self, directive: &Directive, write: &mut W) -> Result<(), Self::Error> {
        match directive {
            Directive::Transaction(txn) => self.render(txn, write),
            Directive::Balance(bal) => self.render(bal, write),
            Directive::Note(note) => self.render(note, write),
            Directive::Pad(pad) => self.render(pad, write),
            Directive::Commodity(commodity) => self.render(commodity, write),
            Directive::Open(open) => self.render(open, write),
            Directive::Close(close) => self.render(close, write),
        }
    }
}

impl<W: Write> Renderer<&Transaction, W> for BasicRenderer {
    type Error = BasicRendererError;

    fn render(&self, txn: &Transaction, write: &mut W) -> Result<(), Self::Error> {
        write!(write, "{} {}", txn.date, txn.flag)?;
        match (&txn.payee, txn.narration.as_str()) {
            // A lone string is always the narration, so a payee with no
            // narration still needs the empty second string.
            (Some(payee), narration) => write!(write, " \"{}\" \"{}\"", payee, narration)?,
            (None, narration) => write!(write, " \"{}\"", narration)?,
        }
        for tag in &txn.tags {
            write!(write, " #{}", tag.trim_start_matches('#'))?;
        }
        for link in &txn.links {
            write!(write, " ^{}", link.trim_start_matches('^'))?;
        }
        writeln!(write)?;
        render_meta(&txn.meta, "  ", write)?;
        for posting in &txn.postings {
            self.render(posting, write)?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer<&Posting, W> for BasicRenderer {
    type Error = BasicRendererError;

    fn render(&self, posting: &Posting, write: &mut W) -> Result<(), Self::Error> {
        write!(write, "  ")?;
        if let Some(flag) = &posting.flag {
            write!(write, "{} ", flag)?;
        }
        write!(write, "{}", posting.account)?;
        if let Some(units) = &posting.units {
            write!(write, "  {}", units)?;
        }
        if let Some(cost) = &posting.cost {
            write!(write, " ")?;
            render_cost(cost, write)?;
        }
        if let Some(price) = &posting.price {
            let symbol = if price.total { "@@" } else { "@" };
            write!(write, " {} {}", symbol, price.amount)?;
        }
        if let Some(comment) = &posting.comment {
            write!(write, " ; {}", comment)?;
        }
        writeln!(write)?;
        render_meta(&posting.meta, "    ", write)?;
        Ok(())
    }
}

impl<W: Write> Renderer<&Balance, W> for BasicRenderer {
    type Error = BasicRendererError;

    fn render(&self, balance: &Balance, write: &mut W) -> Result<(), Self::Error> {
        write!(
            write,
            "{} balance {} {}",
            balance.date, balance.account, balance.amount
        )?;
        if let Some(tolerance) = &balance.tolerance {
            write!(write, " ~ {} {}", tolerance, balance.amount.currency)?;
        }
        writeln!(write)?;
        render_meta(&balance.meta, "  ", write)
    }
}

impl<W: Write> Renderer<&Note, W> for BasicRenderer {
    type Error = BasicRendererError;

    fn render(&self, note: &Note, write: &mut W) -> Result<(), Self::Error> {
        writeln!(
            write,
            "{} note {} \"{}\"",
            note.date, note.account, note.comment
        )?;
        render_meta(&note.meta, "  ", write)
    }
}

impl<W: Write> Renderer<&Pad, W> for BasicRenderer {
    type Error = BasicRendererError;

    fn render(&self, pad: &Pad, write: &mut W) -> Result<(), Self::Error> {
        writeln!(
            write,
            "{} pad {} {}",
            pad.date, pad.account, pad.source_account
        )?;
        render_meta(&pad.meta, "  ", write)
    }
}

impl<W: Write> Renderer<&Commodity, W> for BasicRenderer {
    type Error = BasicRendererError;

    fn render(&self, commodity: &Commodity, write: &mut W) -> Result<(), Self::Error> {
        writeln!(write, "{} commodity {}", commodity.date, commodity.name)?;
        render_meta(&commodity.meta, "  ", write)
    }
}

impl<W: Write> Renderer<&Open, W> for BasicRenderer {
    type Error = BasicRendererError;

    fn render(&self, open: &Open, write: &mut W) -> Result<(), Self::Error> {
        write!(write, "{} open {}", open.date, open.account)?;
        if !open.currencies.is_empty() {
            write!(write, " {}", open.currencies.join(","))?;
        }
        if let Some(booking) = open.booking {
            write!(write, " \"{}\"", booking.as_str())?;
        }
        writeln!(write)?;
        render_meta(&open.meta, "  ", write)
    }
}

impl<W: Write> Renderer<&Close, W> for BasicRenderer {
    type Error = BasicRendererError;

    fn render(&self, close: &Close, write: &mut W) -> Result<(), Self::Error> {
        writeln!(write, "{} close {}", close.date, close.account)?;
        render_meta(&close.meta, "  ", write)
    }
}

fn render_meta<W: Write>(
    meta: &Meta,
    indent: &str,
    write: &mut W,
) -> Result<(), BasicRendererError> {
    for (key, value) in meta.iter() {
        writeln!(write, "{}{}: {}", indent, key, value)?;
    }
    Ok(())
}

fn render_cost<W: Write>(cost: &CostSpec, write: &mut W) -> Result<(), BasicRendererError> {
    let (open, close) = if cost.total { ("{{", "}}") } else { ("{", "}") };
    write!(write, "{}", open)?;
    let mut first = true;
    let sep = |write: &mut W, first: &mut bool| -> Result<(), BasicRendererError> {
        if !*first {
            write!(write, ", ")?;
        }
        *first = false;
        Ok(())
    };
    if let Some(number) = &cost.number {
        sep(write, &mut first)?;
        write!(write, "{}", number)?;
        if let Some(currency) = &cost.currency {
            write!(write, " {}", currency)?;
        }
    }
    if let Some(date) = &cost.date {
        sep(write, &mut first)?;
        write!(write, "{}", date)?;
    }
    if let Some(label) = &cost.label {
        sep(write, &mut first)?;
        write!(write, "\"{}\"", label)?;
    }
    write!(write, "{}", close)?;
    Ok(())
}
