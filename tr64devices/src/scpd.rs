//! Service Control Protocol Description (SCPD) model.
//!
//! An SCPD document lists the actions a service offers, their arguments and
//! the state variables those arguments are typed by.

use indexmap::IndexMap;
use xmltree::Element;

use crate::description::SpecVersion;
use crate::xml::{child_elements, child_text, child_text_or_default, list_items};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn from_text(text: &str) -> Self {
        if text.eq_ignore_ascii_case("out") {
            Direction::Out
        } else {
            Direction::In
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub direction: Direction,
    pub related_state_variable: String,
}

impl Argument {
    fn from_element(elem: &Element) -> Self {
        Self {
            name: child_text_or_default(elem, "name"),
            direction: Direction::from_text(&child_text_or_default(elem, "direction")),
            related_state_variable: child_text_or_default(elem, "relatedStateVariable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub name: String,
    pub arguments: Vec<Argument>,
}

impl Action {
    fn from_element(elem: &Element) -> Self {
        Self {
            name: child_text_or_default(elem, "name"),
            arguments: list_items(elem, "argumentList", "argument")
                .map(Argument::from_element)
                .collect(),
        }
    }

    pub fn in_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments
            .iter()
            .filter(|a| a.direction == Direction::In)
    }

    pub fn out_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments
            .iter()
            .filter(|a| a.direction == Direction::Out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRange {
    pub minimum: Option<String>,
    pub maximum: Option<String>,
    pub step: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVariable {
    pub name: String,
    pub data_type: String,
    pub default_value: Option<String>,
    pub send_events: bool,
    pub allowed_values: Vec<String>,
    pub allowed_value_range: Option<ValueRange>,
}

impl StateVariable {
    fn from_element(elem: &Element) -> Self {
        let send_events = elem
            .attributes
            .get("sendEvents")
            .is_some_and(|v| v.eq_ignore_ascii_case("yes"));

        let allowed_values = list_items(elem, "allowedValueList", "allowedValue")
            .filter_map(|v| v.get_text())
            .map(|v| v.trim().to_string())
            .collect();

        let allowed_value_range = elem.get_child("allowedValueRange").map(|r| ValueRange {
            minimum: child_text(r, "minimum"),
            maximum: child_text(r, "maximum"),
            step: child_text(r, "step"),
        });

        Self {
            name: child_text_or_default(elem, "name"),
            data_type: child_text_or_default(elem, "dataType"),
            default_value: child_text(elem, "defaultValue"),
            send_events,
            allowed_values,
            allowed_value_range,
        }
    }
}

/// Parsed SCPD document of one service.
#[derive(Debug, Clone, Default)]
pub struct Scpd {
    spec_version: Option<SpecVersion>,
    actions: IndexMap<String, Action>,
    state_variables: IndexMap<String, StateVariable>,
}

impl Scpd {
    /// Builds the model from the `<scpd>` root element. Unknown elements
    /// are ignored, an action without a name is dropped.
    pub fn from_root(root: &Element) -> Self {
        let actions = list_items(root, "actionList", "action")
            .map(Action::from_element)
            .filter(|a| !a.name.is_empty())
            .map(|a| (a.name.clone(), a))
            .collect();

        let state_variables = child_elements(root, "serviceStateTable")
            .flat_map(|table| child_elements(table, "stateVariable"))
            .map(StateVariable::from_element)
            .filter(|v| !v.name.is_empty())
            .map(|v| (v.name.clone(), v))
            .collect();

        Self {
            spec_version: root.get_child("specVersion").map(SpecVersion::from_element),
            actions,
            state_variables,
        }
    }

    pub fn spec_version(&self) -> Option<SpecVersion> {
        self.spec_version
    }

    pub fn actions(&self) -> &IndexMap<String, Action> {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn state_variables(&self) -> &IndexMap<String, StateVariable> {
        &self.state_variables
    }

    pub fn state_variable(&self, name: &str) -> Option<&StateVariable> {
        self.state_variables.get(name)
    }
}
