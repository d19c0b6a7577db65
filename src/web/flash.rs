// src/web/flash.rs
//! One-shot feedback messages for the HTML pages, carried in a signed cookie
//! across the redirect that follows every form POST.

use tower_cookies::{Cookie, Cookies, Key};

const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: String,
    pub message: String,
}

pub fn set(cookies: &Cookies, key: &Key, kind: FlashKind, message: &str) {
    let value = format!("{}:{}", kind.as_str(), urlencoding::encode(message));
    let cookie = Cookie::build((FLASH_COOKIE, value)).path("/").http_only(true).build();
    cookies.signed(key).add(cookie);
}

/// Returns the pending message, if any, and clears it.
pub fn take(cookies: &Cookies, key: &Key) -> Option<Flash> {
    let cookie = cookies.signed(key).get(FLASH_COOKIE)?;
    cookies.remove(Cookie::build(FLASH_COOKIE).path("/").build());

    let (kind, encoded) = cookie.value().split_once(':')?;
    let message = urlencoding::decode(encoded).ok()?.into_owned();
    Some(Flash {
        kind: kind.to_string(),
        message,
    })
}
