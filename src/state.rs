//! State sink: recovers per-process image state from the event stream and
//! resolves captured call stacks.

use hashbrown::HashMap;

use crate::event::{header, Event};
use crate::flyweight::{Flyweight, Index};
use crate::symbols::{Image, SymbolEnumerator, SymbolResolver};

// Image events.
const IMAGE_CATEGORY: &str = "Image";
const IMAGE_LOAD_OPERATION: &str = "Load";
const IMAGE_DC_START_OPERATION: &str = "DCStart";
const IMAGE_UNLOAD_OPERATION: &str = "Unload";

// Stack events.
const STACK_WALK_CATEGORY: &str = "StackWalk";
const STACK_WALK_STACK_OPERATION: &str = "Stack";

/// A captured call stack whose resolvable frames were mapped to symbol
/// names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStack {
    /// Raw `EventTimeStamp` of the event the stack belongs to.
    pub event_timestamp: u64,
    pub process_id: u64,
    pub thread_id: u64,

    /// Interned names of the frames that resolved; unresolvable frames
    /// are skipped.
    pub frames: Vec<Index>,
}

pub struct CurrentState<E> {
    symbols: SymbolResolver<E>,

    /// Resolved symbol names are heavily repeated across stacks.
    names: Flyweight<String>,

    stacks: Vec<ResolvedStack>,
    event_counts: HashMap<(String, String), u64>,
}

impl<E: SymbolEnumerator> CurrentState<E> {
    pub fn new(enumerator: E) -> Self {
        Self {
            symbols: SymbolResolver::new(enumerator),
            names: Flyweight::new(),
            stacks: Vec::new(),
            event_counts: HashMap::new(),
        }
    }

    pub fn on_event(&mut self, event: &Event) {
        let Some(category) = event.header().field_as_str(header::CATEGORY) else {
            return;
        };
        let Some(operation) = event.header().field_as_str(header::OPERATION) else {
            return;
        };
        *self
            .event_counts
            .entry((category.to_owned(), operation.to_owned()))
            .or_default() += 1;

        match (category, operation) {
            (IMAGE_CATEGORY, IMAGE_LOAD_OPERATION | IMAGE_DC_START_OPERATION) => {
                self.on_image_load(event)
            }
            (IMAGE_CATEGORY, IMAGE_UNLOAD_OPERATION) => self.on_image_unload(event),
            (STACK_WALK_CATEGORY, STACK_WALK_STACK_OPERATION) => self.on_stack(event),
            _ => {}
        }
    }

    fn on_image_load(&mut self, event: &Event) {
        let payload = event.payload();
        let fields = (
            payload.field_as_u64("ModuleSize"),
            payload.field_as_u32("ImageCheckSum"),
            payload.field_as_u32("TimeDateStamp"),
            payload.field_as_wstr("ImageFileName"),
            payload.field_as_u64("BaseAddress"),
            event.header().field_as_u64(header::PROCESS_ID),
        );
        let (Some(size), Some(checksum), Some(timestamp), Some(filename), Some(base), Some(pid)) =
            fields
        else {
            log::warn!("incomplete Image load event");
            return;
        };

        let image = Image {
            size,
            checksum,
            timestamp,
            filename: filename.to_owned(),
        };
        self.symbols.load_image(pid, base, image);
    }

    fn on_image_unload(&mut self, event: &Event) {
        let base = event.payload().field_as_u64("BaseAddress");
        let pid = event.header().field_as_u64(header::PROCESS_ID);
        let (Some(base), Some(pid)) = (base, pid) else {
            log::warn!("incomplete Image unload event");
            return;
        };
        self.symbols.unload_image(pid, base);
    }

    fn on_stack(&mut self, event: &Event) {
        let payload = event.payload();
        let fields = (
            payload.field_as_u64("EventTimeStamp"),
            payload.field_as_u64("StackProcess"),
            payload.field_as_u64("StackThread"),
            payload.field_as_array("Stack"),
        );
        let (Some(event_timestamp), Some(process_id), Some(thread_id), Some(stack)) = fields
        else {
            log::warn!("incomplete StackWalk event");
            return;
        };

        let mut frames = Vec::new();
        for frame in stack.iter() {
            let Some(address) = frame.as_u64() else {
                log::warn!("StackWalk event with a malformed frame");
                return;
            };
            if let Some(symbol) = self.symbols.resolve_symbol(process_id, address) {
                frames.push(self.names.get_or_intern(symbol.name));
            }
        }

        self.stacks.push(ResolvedStack {
            event_timestamp,
            process_id,
            thread_id,
            frames,
        });
    }

    pub fn symbols(&self) -> &SymbolResolver<E> {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolResolver<E> {
        &mut self.symbols
    }

    /// Stacks collected from `StackWalk` events, in arrival order.
    pub fn stacks(&self) -> &[ResolvedStack] {
        &self.stacks
    }

    /// Resolves an interned frame name.
    pub fn frame_name(&self, index: Index) -> Option<&str> {
        self.names.resolve(index).map(String::as_str)
    }

    /// Number of events seen per `(category, operation)`.
    pub fn event_counts(&self) -> &HashMap<(String, String), u64> {
        &self.event_counts
    }
}
