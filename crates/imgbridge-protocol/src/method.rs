//! Notification method names.
//!
//! Every method is qualified by a host namespace, e.g. `neovide.img.show`.

pub const DEFAULT_NAMESPACE: &str = "neovide";

pub const IMG_UPLOAD: &str = "img.upload";
pub const IMG_SHOW: &str = "img.show";
pub const IMG_HIDE: &str = "img.hide";

/// Join a namespace and an operation into a full method name.
pub fn qualified(namespace: &str, op: &str) -> String {
    format!("{namespace}.{op}")
}

/// Strip `namespace.` from a method name, returning the operation part.
pub fn strip_namespace<'a>(namespace: &str, method: &'a str) -> Option<&'a str> {
    method
        .strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('.'))
}
