use serde::{Deserialize, Serialize};

/// Which field of the shared context a slot mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    File,
    Text,
}

/// A registration mapping one DOM-facing widget to a context field.
///
/// `display_id` names a separate element that shows a human-readable label
/// (file pickers render the chosen file name next to the input); text slots
/// have none.
#[derive(Debug, Clone)]
pub struct SlotBinding {
    pub id: String,
    pub display_id: Option<String>,
}

impl SlotBinding {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_id: None,
        }
    }

    pub fn with_display(id: impl Into<String>, display_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_id: Some(display_id.into()),
        }
    }
}

/// Current rendered state of one registered slot.
#[derive(Debug, Clone)]
pub struct SlotState {
    pub binding: SlotBinding,
    /// The slot's underlying value: the text content for text slots, the
    /// file name for file slots.
    pub value: String,
    /// Label text shown in the slot's display element, when it has one.
    pub label: Option<String>,
    /// Raised when the value arrived via propagation from another slot, so
    /// the shell can show a "changed" indicator. Direct user input never
    /// sets this.
    pub changed: bool,
}

impl SlotState {
    fn new(binding: SlotBinding) -> Self {
        Self {
            binding,
            value: String::new(),
            label: None,
            changed: false,
        }
    }
}

/// Per-kind list of slots the store must keep synchronized. Owned by the
/// store and only mutated under its lock.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    file: Vec<SlotState>,
    text: Vec<SlotState>,
}

impl SlotRegistry {
    /// Registers a slot. Re-registering an id replaces the old binding and
    /// resets the slot's state.
    pub fn register(&mut self, kind: FieldKind, binding: SlotBinding) {
        let slots = self.slots_mut(kind);
        slots.retain(|s| s.binding.id != binding.id);
        slots.push(SlotState::new(binding));
    }

    pub fn get(&self, id: &str) -> Option<&SlotState> {
        self.file
            .iter()
            .chain(self.text.iter())
            .find(|s| s.binding.id == id)
    }

    pub fn value_of(&self, id: &str) -> Option<&str> {
        self.get(id).map(|s| s.value.as_str())
    }

    pub fn len(&self, kind: FieldKind) -> usize {
        match kind {
            FieldKind::File => self.file.len(),
            FieldKind::Text => self.text.len(),
        }
    }

    /// Mirrors a new file name into every file slot except the source:
    /// value and label become the file name, and the changed indicator is
    /// raised. The source slot already shows the name from direct input.
    pub fn propagate_file_name(&mut self, name: &str, source_id: &str) {
        for slot in self.file.iter_mut().filter(|s| s.binding.id != source_id) {
            slot.value = name.to_string();
            slot.label = Some(name.to_string());
            slot.changed = true;
        }
    }

    /// Mirrors new text into every text slot except the source.
    pub fn propagate_text(&mut self, text: &str, source_id: &str) {
        for slot in self.text.iter_mut().filter(|s| s.binding.id != source_id) {
            slot.value = text.to_string();
        }
    }

    fn slots_mut(&mut self, kind: FieldKind) -> &mut Vec<SlotState> {
        match kind {
            FieldKind::File => &mut self.file,
            FieldKind::Text => &mut self.text,
        }
    }
}
