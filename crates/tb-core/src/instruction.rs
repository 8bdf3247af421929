//! Instructions the reasoning library hands to its model.

use std::borrow::Cow;

/// Anything that renders to a single prompt string.
pub trait Instruction {
    fn render(&self) -> Cow<'_, str>;
}

impl Instruction for str {
    fn render(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Instruction for String {
    fn render(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl<T: Instruction + ?Sized> Instruction for &T {
    fn render(&self) -> Cow<'_, str> {
        (**self).render()
    }
}

/// Instruction decorated with a trailing block of text.
///
/// The inner instruction is rendered afresh on every call, so a change in
/// its state is never hidden behind a stale rendering.
#[derive(Debug, Clone)]
pub struct AugmentedInstruction<I> {
    inner: I,
    suffix: String,
}

impl<I: Instruction> AugmentedInstruction<I> {
    /// Wrap `inner`, appending `suffix` on every render.
    pub fn new(inner: I, suffix: impl Into<String>) -> Self {
        Self {
            inner,
            suffix: suffix.into(),
        }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl<I: Instruction> Instruction for AugmentedInstruction<I> {
    fn render(&self) -> Cow<'_, str> {
        if self.suffix.is_empty() {
            return self.inner.render();
        }
        let mut rendered = self.inner.render().into_owned();
        rendered.push_str(&self.suffix);
        Cow::Owned(rendered)
    }
}
