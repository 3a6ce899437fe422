pub mod binding;
pub mod clipboard;
pub mod condition;
pub mod diagram;
pub mod error;
pub mod id;
pub mod index;
pub mod language;
pub mod model;
pub mod ops;
pub mod resolver;
pub mod schema;
pub mod template;
pub mod visual;

// Re-export commonly used types
pub use binding::{BindingPath, BoundText, Scope};
pub use clipboard::{ClipboardData, ClipboardPayload, CLIPBOARD_FORMAT};
pub use condition::{Condition, ConditionError};
pub use diagram::DiagramState;
pub use error::DiagramError;
pub use id::{ElementId, TypeTag};
pub use index::{ModelIndex, VisualEntry};
pub use language::{ElementDocument, Language, LanguageDocument, LanguageElement};
pub use model::{Dimension, Edge, ElementKind, ElementRef, GraphModel, Node, Point};
pub use ops::{
    showcase, ChangeMode, ElementBounds, ElementRoutingPoints, Operation, OperationContext,
    OperationOutcome, SHOWCASE_ELEMENT,
};
pub use resolver::Resolver;
pub use schema::{AttributeSchema, BoundDataPolicy};
pub use template::{PlainTemplate, Template};
pub use visual::{Diagnostic, Rendered, VisualElement, VisualGraph};
