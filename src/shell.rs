//! Command parsing for the interactive shell

use crate::state::FieldType;
use std::path::PathBuf;

/// A parsed shell command.
///
/// Field references are either a field id or a 1-based canvas position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        field_type: FieldType,
        label: Option<String>,
    },
    Label {
        field: String,
        label: String,
    },
    Placeholder {
        field: String,
        placeholder: Option<String>,
    },
    Required {
        field: String,
        required: bool,
    },
    Options {
        field: String,
        options: Vec<String>,
    },
    Remove(String),
    Duplicate(String),
    Move {
        field: String,
        position: usize,
    },
    Select(Option<String>),
    Title(String),
    Undo,
    Redo,
    Preview,
    Save,
    AutoSave(bool),
    Export(Option<PathBuf>),
    Import(PathBuf),
    Clear,
    List,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  add <type> [label]          add a field (text, textarea, email, number, password,
                              date, select, multi-select, checkbox, radio, submit)
  label <field> <text>        rename a field
  placeholder <field> [text]  set or clear a placeholder
  required <field> on|off     toggle required
  options <field> a,b,c       set choice options
  remove <field>              remove a field
  dup <field>                 duplicate a field
  move <field> <position>     move a field (1-based)
  select <field>|none         select a field
  title [text]                set the form title
  undo | redo                 step through history
  preview                     toggle preview mode
  save                        save now
  autosave on|off             toggle auto-save
  export [dir]                write form-<date>.json
  import <path>               load a form definition
  clear                       remove everything
  list | show                 list fields, print JSON
  help | quit";

/// Parse one input line; `Ok(None)` for a blank line
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "add" => {
            let (type_name, label) = split_first(rest);
            let field_type = type_name.parse::<FieldType>()?;
            Command::Add {
                field_type,
                label: non_empty(label),
            }
        }
        "label" => {
            let (field, label) = field_and_rest(rest)?;
            let label = non_empty(label).ok_or("label needs text")?;
            Command::Label { field, label }
        }
        "placeholder" => {
            let (field, text) = field_and_rest(rest)?;
            Command::Placeholder {
                field,
                placeholder: non_empty(text),
            }
        }
        "required" => {
            let (field, flag) = field_and_rest(rest)?;
            Command::Required {
                field,
                required: parse_switch(flag)?,
            }
        }
        "options" => {
            let (field, list) = field_and_rest(rest)?;
            let options = list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>();
            if options.is_empty() {
                return Err("options needs a comma-separated list".to_string());
            }
            Command::Options { field, options }
        }
        "remove" | "rm" => Command::Remove(single_field(rest)?),
        "dup" | "duplicate" => Command::Duplicate(single_field(rest)?),
        "move" | "mv" => {
            let (field, position) = field_and_rest(rest)?;
            let position = position
                .parse::<usize>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or("position must be a number starting at 1")?;
            Command::Move { field, position }
        }
        "select" => match rest {
            "" | "none" => Command::Select(None),
            field => Command::Select(Some(field.to_string())),
        },
        "title" => Command::Title(rest.to_string()),
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "preview" => Command::Preview,
        "save" => Command::Save,
        "autosave" => Command::AutoSave(parse_switch(rest)?),
        "export" => Command::Export(non_empty(rest).map(PathBuf::from)),
        "import" => {
            let path = non_empty(rest).ok_or("import needs a file path")?;
            Command::Import(PathBuf::from(path))
        }
        "clear" => Command::Clear,
        "list" | "ls" => Command::List,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command: {other} (try \"help\")")),
    };
    Ok(Some(command))
}

fn split_first(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (input, ""),
    }
}

fn field_and_rest(input: &str) -> Result<(String, &str), String> {
    let (field, rest) = split_first(input);
    if field.is_empty() {
        return Err("missing field reference".to_string());
    }
    Ok((field.to_string(), rest))
}

fn single_field(input: &str) -> Result<String, String> {
    let (field, _) = field_and_rest(input)?;
    Ok(field)
}

fn parse_switch(input: &str) -> Result<bool, String> {
    match input.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" => Ok(true),
        "off" | "no" | "false" => Ok(false),
        other => Err(format!("expected on or off, got \"{other}\"")),
    }
}

fn non_empty(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
