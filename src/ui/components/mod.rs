mod command_input;
mod input;
mod key_result;
mod list_picker;

pub use command_input::{CommandEvent, CommandInput};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use list_picker::{ListPicker, ListPickerEvent};
