use std::path::{Component, Path};

/// True when `relative` is non-empty and resolves below whatever root it is joined to.
pub fn stays_inside(relative: &Path) -> bool {
    !relative.as_os_str().is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stays_inside() {
        assert!(stays_inside(Path::new("src/app.js")));
        assert!(stays_inside(Path::new("./server.js")));
        assert!(!stays_inside(Path::new("../x.js")));
        assert!(!stays_inside(Path::new("lib/../../x.js")));
        assert!(!stays_inside(Path::new("/abs/x.js")));
        assert!(!stays_inside(Path::new("")));
    }
}
