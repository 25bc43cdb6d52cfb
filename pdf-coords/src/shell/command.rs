//! Parsing of shell command lines.

use std::path::PathBuf;
use std::str::FromStr;

use crate::click_log::{Alignment, DataType, DocumentPart, PointEdit};
use crate::coords::OriginPoint;
use crate::error::{ViewerError, ViewerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomAction {
    In,
    Out,
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open {
        path: PathBuf,
        password: Option<String>,
    },
    Next,
    Prev,
    Page(u32),
    Zoom(ZoomAction),
    Origin(OriginPoint),
    Click {
        x: f64,
        y: f64,
    },
    /// Point numbers are 1-based
    Drag {
        number: usize,
        x: f64,
        y: f64,
    },
    List {
        json: bool,
    },
    Show(usize),
    Edit {
        number: usize,
        edit: PointEdit,
    },
    Delete(usize),
    Reproject,
    Clear,
    Export {
        path: Option<PathBuf>,
        extended: bool,
    },
    Import {
        path: PathBuf,
        append: bool,
    },
    Render(PathBuf),
    /// Stamp point names from a CSV onto a copy of the open PDF
    Overlay {
        csv: PathBuf,
        output: PathBuf,
    },
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  open <path> [password]      open a PDF (clears recorded points)
  next | prev | page <n>      navigate pages
  zoom in|out|reset           change zoom (x1.25 per step)
  origin <corner>             Top-Left, Top-Right, Bottom-Left, Bottom-Right (or tl/tr/bl/br)
  click <x> <y>               click at canvas pixel position
  drag <n> <x> <y>            move point n to canvas pixel position
  list [--json]               list recorded points
  show <n>                    show point n
  edit <n> key=value...       keys: x, y (raw points), name, part, type, align
  delete <n>                  delete point n
  reproject                   re-express all points using the current origin
  clear                       delete all points
  export [path] [--extended]  write points as CSV
  import <path> [--append]    read points from CSV (replaces unless --append)
  render <path>               save the current page with markers as an image
  overlay <csv> <out.pdf>     write a copy of the PDF with point names from a CSV
  status                      show page, zoom and origin
  help                        show this text
  quit | exit                 leave";

/// Split a line on whitespace, honouring double quotes.
fn tokenize(line: &str) -> ViewerResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err(ViewerError::invalid_command("unterminated quote"));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn number<T: FromStr>(value: Option<&String>, what: &str) -> ViewerResult<T> {
    let value = value.ok_or_else(|| ViewerError::invalid_command(format!("missing {}", what)))?;
    value
        .parse()
        .map_err(|_| ViewerError::invalid_command(format!("invalid {} '{}'", what, value)))
}

fn coordinate(value: Option<&String>, what: &str) -> ViewerResult<f64> {
    let n: f64 = number(value, what)?;
    if !n.is_finite() {
        return Err(ViewerError::invalid_command(format!(
            "{} must be a finite number",
            what
        )));
    }
    Ok(n)
}

fn point_number(value: Option<&String>) -> ViewerResult<usize> {
    let n: usize = number(value, "point number")?;
    if n == 0 {
        return Err(ViewerError::invalid_command("point numbers start at 1"));
    }
    Ok(n)
}

fn parse_enum<T: FromStr>(value: &str, what: &str) -> ViewerResult<T> {
    T::from_str(value)
        .map_err(|_| ViewerError::invalid_command(format!("unknown {} '{}'", what, value)))
}

fn parse_edit(args: &[String]) -> ViewerResult<PointEdit> {
    let mut edit = PointEdit::default();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| ViewerError::invalid_command(format!("expected key=value, got '{}'", arg)))?;
        match key.to_ascii_lowercase().as_str() {
            "x" => edit.raw_x = Some(coordinate(Some(&value.to_string()), "x")?),
            "y" => edit.raw_y = Some(coordinate(Some(&value.to_string()), "y")?),
            "name" => edit.name = Some(value.to_string()),
            "part" => edit.part = Some(parse_enum::<DocumentPart>(value, "part")?),
            "type" => edit.data_type = Some(parse_enum::<DataType>(value, "data type")?),
            "align" => edit.alignment = Some(parse_enum::<Alignment>(value, "alignment")?),
            other => {
                return Err(ViewerError::invalid_command(format!(
                    "unknown field '{}'",
                    other
                )));
            }
        }
    }
    if edit.is_empty() {
        return Err(ViewerError::invalid_command("edit needs at least one key=value"));
    }
    Ok(edit)
}

/// Parse a line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> ViewerResult<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens = tokenize(trimmed)?;
    let Some((name, args)) = tokens.split_first() else {
        return Ok(None);
    };
    let flag = |f: &str| args.iter().any(|a| a == f);
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let command = match name.to_ascii_lowercase().as_str() {
        "open" => Command::Open {
            path: positional
                .first()
                .map(PathBuf::from)
                .ok_or_else(|| ViewerError::invalid_command("open needs a path"))?,
            password: positional.get(1).map(|s| s.to_string()),
        },
        "next" => Command::Next,
        "prev" | "previous" => Command::Prev,
        "page" => Command::Page(number(args.first(), "page number")?),
        "zoom" => Command::Zoom(match args.first().map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("in") | Some("+") => ZoomAction::In,
            Some("out") | Some("-") => ZoomAction::Out,
            Some("reset") | Some("1") => ZoomAction::Reset,
            _ => return Err(ViewerError::invalid_command("zoom takes in, out or reset")),
        }),
        "origin" => {
            let value = args
                .first()
                .ok_or_else(|| ViewerError::invalid_command("origin needs a corner"))?;
            Command::Origin(parse_enum(value, "origin")?)
        }
        "click" => Command::Click {
            x: coordinate(args.first(), "x")?,
            y: coordinate(args.get(1), "y")?,
        },
        "drag" => Command::Drag {
            number: point_number(args.first())?,
            x: coordinate(args.get(1), "x")?,
            y: coordinate(args.get(2), "y")?,
        },
        "list" | "ls" => Command::List {
            json: flag("--json"),
        },
        "show" => Command::Show(point_number(args.first())?),
        "edit" => Command::Edit {
            number: point_number(args.first())?,
            edit: parse_edit(args.get(1..).unwrap_or_default())?,
        },
        "delete" | "rm" => Command::Delete(point_number(args.first())?),
        "reproject" => Command::Reproject,
        "clear" => Command::Clear,
        "export" => Command::Export {
            path: positional.first().map(PathBuf::from),
            extended: flag("--extended"),
        },
        "import" => Command::Import {
            path: positional
                .first()
                .map(PathBuf::from)
                .ok_or_else(|| ViewerError::invalid_command("import needs a path"))?,
            append: flag("--append"),
        },
        "render" => Command::Render(
            positional
                .first()
                .map(PathBuf::from)
                .ok_or_else(|| ViewerError::invalid_command("render needs a path"))?,
        ),
        "overlay" => match positional.as_slice() {
            [csv, output] => Command::Overlay {
                csv: PathBuf::from(csv),
                output: PathBuf::from(output),
            },
            _ => {
                return Err(ViewerError::invalid_command(
                    "overlay needs a CSV path and an output PDF path",
                ));
            }
        },
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(ViewerError::invalid_command(format!(
                "unknown command '{}' (try help)",
                other
            )));
        }
    };

    Ok(Some(command))
}
