//! Password protection, unlocking and metadata scrubbing
//!
//! Protection writes the standard security handler with AES-256
//! (`/V 5`, `/R 6`). Unlocking also reads the older RC4 and AES-128
//! revisions.

use lopdf::{Document, Object, StringFormat};
use tracing::{debug, info, warn};

use crate::crypt::{Direction, SecurityHandler};
use crate::document::{save_document, PdfDocument};
use crate::error::PdfEditError;

/// Encrypt with `password` as both user and owner password.
pub fn protect(pdf: &[u8], password: &str) -> Result<Vec<u8>, PdfEditError> {
    if password.is_empty() {
        return Err(PdfEditError::Input("Password must not be empty".into()));
    }
    let mut doc = PdfDocument::open(pdf)?.into_inner();
    doc.prune_objects();
    doc.compress();

    let file_id = uuid::Uuid::new_v4().as_bytes().to_vec();
    let (handler, file_key) = SecurityHandler::create_aes256(password, password, file_id.clone())?;
    let encrypted = handler.transform_objects(&mut doc, &file_key, None, Direction::Encrypt)?;

    let encrypt_id = doc.add_object(handler.encrypt_dictionary());
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
    doc.trailer.set(
        "ID",
        vec![
            Object::String(file_id.clone(), StringFormat::Hexadecimal),
            Object::String(file_id, StringFormat::Hexadecimal),
        ],
    );
    info!("Encrypted {} objects (AES-256)", encrypted);
    save_document(&mut doc)
}

/// Decrypt with `password` (user or owner) and save without encryption.
/// Documents that are not encrypted come back unchanged in content.
pub fn unlock(pdf: &[u8], password: &str) -> Result<Vec<u8>, PdfEditError> {
    let mut doc = Document::load_mem(pdf)
        .map_err(|e| PdfEditError::Format(e.to_string()))?;
    if doc.trailer.get(b"Encrypt").is_err() {
        warn!("Unlock requested for a document without encryption");
        return save_document(&mut doc);
    }

    let (handler, encrypt_id) = SecurityHandler::from_document(&doc)?;
    let file_key = handler.authenticate(password)?;
    let decrypted = handler.transform_objects(&mut doc, &file_key, encrypt_id, Direction::Decrypt)?;
    debug!("Decrypted {} objects", decrypted);

    doc.trailer.remove(b"Encrypt");
    if let Some(id) = encrypt_id {
        doc.objects.remove(&id);
    }
    info!(
        "Removed V{} R{} encryption",
        handler.version, handler.revision
    );
    save_document(&mut doc)
}

/// Drop the document information dictionary and the catalog's XMP stream.
pub fn strip_metadata(pdf: &[u8]) -> Result<Vec<u8>, PdfEditError> {
    let mut doc = PdfDocument::open(pdf)?.into_inner();

    let info_keys = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).map(|d| d.len()).unwrap_or(0),
        Ok(Object::Dictionary(dict)) => dict.len(),
        _ => 0,
    };
    doc.trailer.remove(b"Info");

    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PdfEditError::Format("No Root in trailer".into()))?;
    let had_xmp = doc
        .get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
        .map(|catalog| catalog.remove(b"Metadata").is_some())
        .unwrap_or(false);

    doc.prune_objects();
    info!(
        "Stripped {} info entries{}",
        info_keys,
        if had_xmp { " and XMP metadata" } else { "" }
    );
    save_document(&mut doc)
}
