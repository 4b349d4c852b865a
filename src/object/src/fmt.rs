use core::fmt;

#[derive(Copy, Clone)]
pub struct DisplayFromFn<F>(pub F)
where
    F: Fn(&mut fmt::Formatter) -> fmt::Result;

impl<F> fmt::Debug for DisplayFromFn<F>
where
    F: Fn(&mut fmt::Formatter) -> fmt::Result,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0(f)
    }
}

impl<F> fmt::Display for DisplayFromFn<F>
where
    F: Fn(&mut fmt::Formatter) -> fmt::Result,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0(f)
    }
}

/// Writes the `Class` or `Class(script.ext)` prefix shared by callable and signal text forms.
pub(crate) fn write_class_prefix(
    f: &mut fmt::Formatter<'_>,
    class_name: &str,
    script_path: Option<&str>,
) -> fmt::Result {
    f.write_str(class_name)?;

    if let Some(path) = script_path.filter(|path| !path.is_empty()) {
        let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
        write!(f, "({file})")?;
    }

    Ok(())
}
