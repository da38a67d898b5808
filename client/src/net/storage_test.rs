use super::*;

#[test]
fn keeps_configured_key() {
    let store = LocalStorageTokenStore::new("formbase_token");
    assert_eq!(store.key(), "formbase_token");
}

#[cfg(not(feature = "csr"))]
#[test]
fn reads_nothing_outside_the_browser() {
    let store = LocalStorageTokenStore::new("formbase_token");
    store.set_token(Some("tok"));
    assert_eq!(store.get_token(), None);
    store.clear_token();
    assert_eq!(store.get_token(), None);
}
