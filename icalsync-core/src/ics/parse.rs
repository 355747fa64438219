//! ICS document parsing using the icalendar crate's parser.
//!
//! The borrowed parser tree is converted right away into owned types so the
//! document can outlive the raw feed text.

use icalendar::parser::{read_calendar, unfold};

use crate::error::{IcalSyncError, IcalSyncResult};

/// A content line: name, value and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub params: Vec<(String, Option<String>)>,
}

impl Property {
    /// Look up a parameter value (e.g. `TZID`), case-insensitively.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.as_deref())
    }
}

/// Properties and nested components of one `BEGIN:`/`END:` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub properties: Vec<Property>,
    pub children: Vec<Component>,
}

impl Block {
    /// First property with this name.
    pub fn prop(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Value of the first property with this name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.prop(name).map(|p| p.value.as_str())
    }
}

/// A parsed component, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Event(Block),
    Todo(Block),
    Journal(Block),
    Timezone(Block),
    Other { name: String, block: Block },
}

impl Component {
    fn from_parts(name: &str, block: Block) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "VEVENT" => Component::Event(block),
            "VTODO" => Component::Todo(block),
            "VJOURNAL" => Component::Journal(block),
            "VTIMEZONE" => Component::Timezone(block),
            _ => Component::Other {
                name: name.to_string(),
                block,
            },
        }
    }
}

/// A parsed calendar: top-level properties plus its component blocks in feed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarDocument {
    pub properties: Vec<Property>,
    pub components: Vec<Component>,
}

impl CalendarDocument {
    /// Calendar-level property value, ignoring empty ones.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.trim())
            .filter(|v| !v.is_empty())
    }

    /// Event blocks in feed order; other kinds are skipped.
    pub fn events(&self) -> impl Iterator<Item = &Block> {
        self.components.iter().filter_map(|c| match c {
            Component::Event(block) => Some(block),
            Component::Todo(_)
            | Component::Journal(_)
            | Component::Timezone(_)
            | Component::Other { .. } => None,
        })
    }
}

/// Parse raw ICS text into a calendar document.
pub fn parse_calendar(content: &str) -> IcalSyncResult<CalendarDocument> {
    let unfolded = unfold(content);
    let head = unfolded.trim_start_matches('\u{feff}').trim_start();
    let has_root = head
        .get(.."BEGIN:VCALENDAR".len())
        .is_some_and(|h| h.eq_ignore_ascii_case("BEGIN:VCALENDAR"));
    if !has_root {
        return Err(IcalSyncError::Parse(
            "Document does not start with BEGIN:VCALENDAR".to_string(),
        ));
    }

    let calendar = read_calendar(head).map_err(|e| IcalSyncError::Parse(e.to_string()))?;

    let mut document = CalendarDocument {
        properties: calendar.properties.iter().map(convert_property).collect(),
        components: Vec::new(),
    };

    for component in &calendar.components {
        // Several VCALENDARs in one file are merged into one document
        if component.name.as_ref().eq_ignore_ascii_case("VCALENDAR") {
            document
                .properties
                .extend(component.properties.iter().map(convert_property));
            document
                .components
                .extend(component.components.iter().map(convert_component));
        } else {
            document.components.push(convert_component(component));
        }
    }

    Ok(document)
}

fn convert_property(prop: &icalendar::parser::Property<'_>) -> Property {
    Property {
        name: prop.name.to_string(),
        value: prop.val.to_string(),
        params: prop
            .params
            .iter()
            .map(|p| (p.key.to_string(), p.val.as_ref().map(|v| v.to_string())))
            .collect(),
    }
}

fn convert_component(component: &icalendar::parser::Component<'_>) -> Component {
    let block = Block {
        properties: component.properties.iter().map(convert_property).collect(),
        children: component.components.iter().map(convert_component).collect(),
    };
    Component::from_parts(component.name.as_ref(), block)
}
