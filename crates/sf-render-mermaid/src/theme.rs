//! Style classes for control and risk annotations.

use sf_core::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleClass {
    pub name: &'static str,
    pub fill: &'static str,
    pub stroke: &'static str,
    pub stroke_width: &'static str,
}

impl StyleClass {
    /// `classDef` statement declaring this class.
    #[must_use]
    pub fn definition(&self) -> String {
        format!(
            "classDef {} fill:{},stroke:{},stroke-width:{}",
            self.name, self.fill, self.stroke, self.stroke_width
        )
    }
}

pub const CONTROL: StyleClass = StyleClass {
    name: "control",
    fill: "#e3f2fd",
    stroke: "#1565c0",
    stroke_width: "2px",
};

pub const RISK: StyleClass = StyleClass {
    name: "risk",
    fill: "#ffebee",
    stroke: "#c62828",
    stroke_width: "2px",
};

/// Emitted after the edges, in this order, for every document.
pub const STYLE_CLASSES: [StyleClass; 2] = [CONTROL, RISK];

/// Classes to attach to a step's node, control first.
#[must_use]
pub fn classes_for(step: &Step) -> Vec<&'static StyleClass> {
    let mut classes = Vec::with_capacity(2);
    if step.has_controls() {
        classes.push(&CONTROL);
    }
    if step.has_risks() {
        classes.push(&RISK);
    }
    classes
}
