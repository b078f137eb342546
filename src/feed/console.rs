use crate::kernel::event::{Event, InputEvent, OperatorAction};
use crate::kernel::incident::{CategoryId, FieldEdit, FieldKey, Severity};

pub const HELP: &str = "\
Plain lines are appended to the transcript. Commands:
  /category <id>          pin the incident category
  /severity <level>       pin severity (critical, moderate, stable)
  /clear                  drop manual overrides
  /edit <field> <value>   correct and verify a field
  /reopen <field>         let extraction update a verified field again
  /phone <number>         caller number from the line
  /dispatch               send a unit
  /end                    end the call";

/// Turn one console line into a reactor event.
///
/// `Ok(None)` for blank lines. A malformed command is an `Err` with a message
/// for the operator, never a transcript chunk.
pub fn parse_console_line(source: &str, line: &str) -> Result<Option<Event>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(Event::Input(InputEvent::transcript(source, line))));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    let action = match name {
        "category" => {
            if rest.is_empty() {
                return Err("usage: /category <id>".to_string());
            }
            OperatorAction::SelectCategory(CategoryId::new(rest))
        }
        "severity" => OperatorAction::SelectSeverity(rest.parse::<Severity>()?),
        "clear" => OperatorAction::ClearOverride,
        "edit" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: /edit <field> <value>".to_string())?;
            OperatorAction::EditField(FieldEdit::parse(field.parse::<FieldKey>()?, value.trim())?)
        }
        "reopen" => OperatorAction::ReopenField(rest.parse::<FieldKey>()?),
        "phone" => {
            if rest.is_empty() {
                return Err("usage: /phone <number>".to_string());
            }
            return Ok(Some(Event::Input(InputEvent::call_metadata(source, rest))));
        }
        "dispatch" => OperatorAction::RequestDispatch,
        "end" => OperatorAction::EndCall,
        other => return Err(format!("unknown command '/{}'", other)),
    };

    Ok(Some(Event::Operator(action)))
}
