//! STEP writer implementation.

use chrono::Utc;

use ifc_core::{Document, EntityRef, Value};

use crate::SerializeOptions;

/// Render `document` as a complete physical file.
pub fn to_step(document: &Document, options: &SerializeOptions) -> String {
    let mut builder = StepBuilder::new(document, options);
    builder.write_header();
    builder.write_data();
    builder.finish()
}

/// Builder for STEP file content.
struct StepBuilder<'a> {
    document: &'a Document,
    options: &'a SerializeOptions,
    output: String,
}

impl<'a> StepBuilder<'a> {
    fn new(document: &'a Document, options: &'a SerializeOptions) -> Self {
        Self {
            document,
            options,
            output: String::new(),
        }
    }

    fn write_header(&mut self) {
        let options = self.options;
        let timestamp = options
            .timestamp
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%dT%H:%M:%S");
        let application = escape_step_string(&format!(
            "{} {}",
            options.application_name, options.application_version
        ));

        self.output.push_str("ISO-10303-21;\n");
        self.output.push_str("HEADER;\n");
        self.output.push_str(&format!(
            "FILE_DESCRIPTION(('{}'),'2;1');\n",
            escape_step_string(&options.description)
        ));
        self.output.push_str(&format!(
            "FILE_NAME('{}','{}',('{}'),('{}'),'{}','{}','');\n",
            escape_step_string(&self.document.metadata().file_name),
            timestamp,
            escape_step_string(&options.author),
            escape_step_string(&owner_organization(self.document)),
            application,
            application,
        ));
        self.output.push_str(&format!(
            "FILE_SCHEMA(('{}'));\n",
            escape_step_string(self.document.schema())
        ));
        self.output.push_str("ENDSEC;\n");
    }

    fn write_data(&mut self) {
        self.output.push_str("DATA;\n");
        for (index, entity) in self.document.iter().enumerate() {
            self.output.push_str(&format!("#{}= ", index + 1));
            self.write_instance(entity);
            self.output.push_str(";\n");
        }
        self.output.push_str("ENDSEC;\n");
        self.output.push_str("END-ISO-10303-21;\n");
    }

    /// `TYPE(params)` without id or terminator.
    fn write_instance(&mut self, entity: &EntityRef) {
        self.output.push_str(&entity.type_name().to_ascii_uppercase());
        self.output.push('(');
        for (i, value) in entity.attributes().iter().enumerate() {
            if i > 0 {
                self.output.push(',');
            }
            self.write_value(value);
        }
        self.output.push(')');
    }

    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.output.push('$'),
            Value::Derived => self.output.push('*'),
            Value::Integer(v) => self.output.push_str(&v.to_string()),
            Value::Real(v) => self.output.push_str(&format_real(*v)),
            Value::String(s) => {
                self.output.push('\'');
                self.output.push_str(&escape_step_string(s));
                self.output.push('\'');
            }
            Value::Boolean(b) => self.output.push_str(if *b { ".T." } else { ".F." }),
            Value::Enum(e) => self.output.push_str(&format!(".{}.", e.to_ascii_uppercase())),
            Value::List(items) => {
                self.output.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.output.push(',');
                    }
                    self.write_value(item);
                }
                self.output.push(')');
            }
            Value::Entity(entity) => match self.document.position(entity.id()) {
                Some(index) => self.output.push_str(&format!("#{}", index + 1)),
                None => self.write_instance(entity),
            },
            Value::Select(select) => self.write_value(select.innermost()),
        }
    }

    fn finish(self) -> String {
        self.output
    }
}

/// Organization name from the first project's owner history.
fn owner_organization(document: &Document) -> String {
    document
        .all_of_kind("IfcProject")
        .next()
        .and_then(|project| linked(project, "OwnerHistory"))
        .and_then(|history| linked(history, "OwningUser"))
        .and_then(|user| linked(user, "TheOrganization"))
        .and_then(|organization| organization.attribute("Name"))
        .and_then(Value::text)
        .map(str::to_string)
        .unwrap_or_else(|| SerializeOptions::DEFAULT_ORGANIZATION.to_string())
}

fn linked<'e>(entity: &'e EntityRef, attribute: &str) -> Option<&'e EntityRef> {
    entity.attribute(attribute)?.unwrap_select().as_entity()
}

/// Escape a string for STEP format.
///
/// Quotes and backslashes are doubled. Other characters outside printable
/// ASCII are written as `\X2\...\X0\` runs of 4-digit code points, or as
/// 8-digit `\X4\` runs above U+FFFF.
pub fn escape_step_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // Open run: (directive, code points).
    let mut run: Option<(&str, Vec<u32>)> = None;

    for c in s.chars() {
        let directive = match c {
            ' ' => None,
            c if c.is_ascii_graphic() => None,
            c if (c as u32) > 0xFFFF => Some("X4"),
            _ => Some("X2"),
        };
        match directive {
            None => {
                flush_run(&mut run, &mut out);
                match c {
                    '\'' => out.push_str("''"),
                    '\\' => out.push_str("\\\\"),
                    _ => out.push(c),
                }
            }
            Some(directive) => {
                if run.as_ref().map(|(open, _)| *open) != Some(directive) {
                    flush_run(&mut run, &mut out);
                    run = Some((directive, Vec::new()));
                }
                if let Some((_, codes)) = run.as_mut() {
                    codes.push(c as u32);
                }
            }
        }
    }
    flush_run(&mut run, &mut out);
    out
}

fn flush_run(run: &mut Option<(&str, Vec<u32>)>, out: &mut String) {
    let Some((directive, codes)) = run.take() else {
        return;
    };
    out.push_str(&format!("\\{}\\", directive));
    for code in codes {
        if directive == "X4" {
            out.push_str(&format!("{:08X}", code));
        } else {
            out.push_str(&format!("{:04X}", code));
        }
    }
    out.push_str("\\X0\\");
}

/// Format a real number for STEP.
///
/// Uses the shortest text that reads back to the same value and always
/// includes a decimal point. Non-finite values have no STEP spelling and are
/// written as `$`.
pub fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return "$".to_string();
    }
    let text = format!("{:?}", value);
    let (mantissa, exponent) = match text.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (text.as_str(), None),
    };

    let mut out = match mantissa.strip_suffix(".0") {
        Some(whole) => format!("{}.", whole),
        None if mantissa.contains('.') => mantissa.to_string(),
        None => format!("{}.", mantissa),
    };
    if let Some(exponent) = exponent {
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ("-", digits),
            None => ("", exponent),
        };
        out.push_str(&format!("E{}{:0>2}", sign, digits));
    }
    out
}
