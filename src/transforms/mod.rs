//! Built-in transforms.
//!
//! Every transform has the same shape: it reads the current surface, may ask
//! the backend to create or draw surfaces, and returns the next surface. None
//! of them mutates its input.
//!
//! | Name | Options | Effect |
//! |---|---|---|
//! | `resize` | `fit`, `smoothing` | Scale down to fit a bounding box |
//! | `grayscale` | none | Luma conversion, alpha kept |
//! | `sharpen` | `sigma`, `threshold` | Unsharp mask |

mod grayscale;
mod resize;
mod sharpen;

pub use grayscale::grayscale;
pub use resize::resize;
pub use sharpen::sharpen;

use crate::registry::TransformFn;
use std::rc::Rc;

/// The fixed built-in set, in registration order.
pub fn builtin() -> Vec<(&'static str, TransformFn)> {
    vec![
        ("resize", Rc::new(resize) as TransformFn),
        ("grayscale", Rc::new(grayscale) as TransformFn),
        ("sharpen", Rc::new(sharpen) as TransformFn),
    ]
}
