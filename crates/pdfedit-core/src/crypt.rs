//! Standard security handler
//!
//! Password checks, key derivation and per-object ciphers for the
//! password-based handler. New documents are written with AES-256
//! (`/V 5`, `/R 6`). Reading also accepts RC4 (`/V 1`, `/V 2`), the
//! `/V 4` crypt filters (RC4 or AES-128) and the `/R 5` AES-256 draft.

use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use md5::Md5;
use rc4::{KeyInit, Rc4, StreamCipher};
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::warn;

use crate::error::PdfEditError;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// All permissions granted.
pub(crate) const PERMISSIONS: i32 = -4;

const AES_BLOCK: usize = 16;
const AES256_KEY_LEN: usize = 32;

/// Passwords for revisions 5 and 6 are UTF-8, cut at 127 bytes.
const MAX_UTF8_PASSWORD: usize = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cipher {
    Identity,
    Rc4,
    Aes128,
    Aes256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Encrypt,
    Decrypt,
}

/// Parameters of a standard security handler, read from an `/Encrypt`
/// dictionary or created for a new document.
#[derive(Debug, Clone)]
pub(crate) struct SecurityHandler {
    pub(crate) version: i64,
    pub(crate) revision: i64,
    key_len: usize,
    stream_cipher: Cipher,
    string_cipher: Cipher,
    owner_entry: Vec<u8>,
    user_entry: Vec<u8>,
    owner_key_entry: Vec<u8>,
    user_key_entry: Vec<u8>,
    perms_entry: Vec<u8>,
    permissions: i32,
    encrypt_metadata: bool,
    file_id: Vec<u8>,
}

impl SecurityHandler {
    /// AES-256 revision 6 handler with a fresh file key, returned alongside.
    pub(crate) fn create_aes256(
        user_password: &str,
        owner_password: &str,
        file_id: Vec<u8>,
    ) -> Result<(Self, Vec<u8>), PdfEditError> {
        let user_password = utf8_password(user_password.as_bytes());
        let owner_password = utf8_password(owner_password.as_bytes());
        let file_key = random_bytes(AES256_KEY_LEN);
        let salts = random_bytes(32);
        let (user_validation, user_key_salt) = (&salts[0..8], &salts[8..16]);
        let (owner_validation, owner_key_salt) = (&salts[16..24], &salts[24..32]);
        let zero_iv = [0u8; AES_BLOCK];

        let mut user_entry = hardened_hash(user_password, user_validation, &[])?;
        user_entry.extend_from_slice(user_validation);
        user_entry.extend_from_slice(user_key_salt);
        let user_key_entry = aes256_raw(
            &hardened_hash(user_password, user_key_salt, &[])?,
            &zero_iv,
            &file_key,
            Direction::Encrypt,
        )?;

        let mut owner_entry = hardened_hash(owner_password, owner_validation, &user_entry)?;
        owner_entry.extend_from_slice(owner_validation);
        owner_entry.extend_from_slice(owner_key_salt);
        let owner_key_entry = aes256_raw(
            &hardened_hash(owner_password, owner_key_salt, &user_entry)?,
            &zero_iv,
            &file_key,
            Direction::Encrypt,
        )?;

        let mut perms = [0u8; AES_BLOCK];
        perms[..4].copy_from_slice(&PERMISSIONS.to_le_bytes());
        perms[4..8].copy_from_slice(&[0xFF; 4]);
        perms[8] = b'T';
        perms[9..12].copy_from_slice(b"adb");
        perms[12..].copy_from_slice(&random_bytes(4));
        let perms_entry = aes256_raw(&file_key, &zero_iv, &perms, Direction::Encrypt)?;

        let handler = Self {
            version: 5,
            revision: 6,
            key_len: AES256_KEY_LEN,
            stream_cipher: Cipher::Aes256,
            string_cipher: Cipher::Aes256,
            owner_entry,
            user_entry,
            owner_key_entry,
            user_key_entry,
            perms_entry,
            permissions: PERMISSIONS,
            encrypt_metadata: true,
            file_id,
        };
        Ok((handler, file_key))
    }

    pub(crate) fn from_document(
        doc: &Document,
    ) -> Result<(Self, Option<ObjectId>), PdfEditError> {
        let (dict, encrypt_id) = match doc.trailer.get(b"Encrypt") {
            Ok(Object::Reference(id)) => (
                doc.get_dictionary(*id)
                    .map_err(|e| PdfEditError::Format(format!("Bad /Encrypt: {}", e)))?,
                Some(*id),
            ),
            Ok(Object::Dictionary(dict)) => (dict, None),
            _ => return Err(PdfEditError::Format("Missing /Encrypt dictionary".into())),
        };

        match dict.get(b"Filter").and_then(Object::as_name) {
            Ok(b"Standard") => {}
            _ => return Err(unsupported("security handler")),
        }
        let version = dict.get(b"V").and_then(Object::as_i64).unwrap_or(0);
        let revision = dict
            .get(b"R")
            .and_then(Object::as_i64)
            .map_err(|_| PdfEditError::Format("Missing /R".into()))?;

        let (key_len, stream_cipher, string_cipher) = match (version, revision) {
            (1, 2 | 3) => (5, Cipher::Rc4, Cipher::Rc4),
            (2, 2 | 3) => {
                let bits = dict.get(b"Length").and_then(Object::as_i64).unwrap_or(40);
                if bits <= 0 || bits % 8 != 0 || bits > 128 {
                    return Err(PdfEditError::Format(format!("Invalid /Length {}", bits)));
                }
                ((bits / 8) as usize, Cipher::Rc4, Cipher::Rc4)
            }
            (4, 4) => (
                16,
                crypt_filter(dict, b"StmF")?,
                crypt_filter(dict, b"StrF")?,
            ),
            (5, 5 | 6) => (
                AES256_KEY_LEN,
                crypt_filter(dict, b"StmF")?,
                crypt_filter(dict, b"StrF")?,
            ),
            _ => {
                return Err(unsupported(&format!(
                    "encryption V{} R{}",
                    version, revision
                )))
            }
        };

        let string_entry = |key: &[u8]| match dict.get(key) {
            Ok(Object::String(bytes, _)) => Ok(bytes.clone()),
            _ => Err(PdfEditError::Format(format!(
                "Missing /{}",
                String::from_utf8_lossy(key)
            ))),
        };
        let owner_entry = string_entry(b"O")?;
        let user_entry = string_entry(b"U")?;
        let (owner_key_entry, user_key_entry, perms_entry) = if revision >= 5 {
            if owner_entry.len() < 48 || user_entry.len() < 48 {
                return Err(PdfEditError::Format("Unexpected /O or /U length".into()));
            }
            let owner_key_entry = string_entry(b"OE")?;
            let user_key_entry = string_entry(b"UE")?;
            if owner_key_entry.len() != 32 || user_key_entry.len() != 32 {
                return Err(PdfEditError::Format("Unexpected /OE or /UE length".into()));
            }
            let perms_entry = string_entry(b"Perms").unwrap_or_default();
            (owner_key_entry, user_key_entry, perms_entry)
        } else {
            if owner_entry.len() < 32 || user_entry.len() < 16 {
                return Err(PdfEditError::Format("Unexpected /O or /U length".into()));
            }
            (Vec::new(), Vec::new(), Vec::new())
        };

        let permissions = dict
            .get(b"P")
            .and_then(Object::as_i64)
            .map_err(|_| PdfEditError::Format("Missing /P".into()))? as i32;
        let encrypt_metadata = dict
            .get(b"EncryptMetadata")
            .and_then(Object::as_bool)
            .unwrap_or(true);

        let file_id = match doc.trailer.get(b"ID") {
            Ok(Object::Array(ids)) => match ids.first() {
                Some(Object::String(bytes, _)) => bytes.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        Ok((
            Self {
                version,
                revision,
                key_len,
                stream_cipher,
                string_cipher,
                owner_entry,
                user_entry,
                owner_key_entry,
                user_key_entry,
                perms_entry,
                permissions,
                encrypt_metadata,
                file_id,
            },
            encrypt_id,
        ))
    }

    /// File key for `password`, tried as the user password first and then
    /// as the owner password.
    pub(crate) fn authenticate(&self, password: &str) -> Result<Vec<u8>, PdfEditError> {
        let key = if self.revision >= 5 {
            self.authenticate_aes256(utf8_password(password.as_bytes()))?
        } else {
            self.authenticate_legacy(password.as_bytes())?
        };
        key.ok_or_else(|| PdfEditError::Password("Incorrect password".into()))
    }

    fn authenticate_aes256(&self, password: &[u8]) -> Result<Option<Vec<u8>>, PdfEditError> {
        let user_data = &self.user_entry[..48];
        let zero_iv = [0u8; AES_BLOCK];

        let key = if self.salted_hash(password, &self.owner_entry[32..40], user_data)?
            == self.owner_entry[..32]
        {
            let intermediate = self.salted_hash(password, &self.owner_entry[40..48], user_data)?;
            aes256_raw(&intermediate, &zero_iv, &self.owner_key_entry, Direction::Decrypt)?
        } else if self.salted_hash(password, &self.user_entry[32..40], &[])?
            == self.user_entry[..32]
        {
            let intermediate = self.salted_hash(password, &self.user_entry[40..48], &[])?;
            aes256_raw(&intermediate, &zero_iv, &self.user_key_entry, Direction::Decrypt)?
        } else {
            return Ok(None);
        };

        if self.perms_entry.len() >= AES_BLOCK {
            let perms = aes256_raw(&key, &zero_iv, &self.perms_entry[..AES_BLOCK], Direction::Decrypt)?;
            if &perms[9..12] != b"adb" {
                warn!("/Perms does not match the file key");
            }
        }
        Ok(Some(key))
    }

    /// Revision 6 hashes with the iterated algorithm, revision 5 with one SHA-256.
    fn salted_hash(
        &self,
        password: &[u8],
        salt: &[u8],
        user_data: &[u8],
    ) -> Result<Vec<u8>, PdfEditError> {
        if self.revision >= 6 {
            return hardened_hash(password, salt, user_data);
        }
        let mut hasher = Sha256::new();
        hasher.update(password);
        hasher.update(salt);
        hasher.update(user_data);
        Ok(hasher.finalize().to_vec())
    }

    fn authenticate_legacy(&self, password: &[u8]) -> Result<Option<Vec<u8>>, PdfEditError> {
        let direct_key = self.derive_file_key(password);
        if self.validates_user_key(&direct_key) {
            return Ok(Some(direct_key));
        }

        let recovered = self.owner_password_to_user_password(password)?;
        let owner_key = self.derive_file_key(&recovered);
        if self.validates_user_key(&owner_key) {
            return Ok(Some(owner_key));
        }
        Ok(None)
    }

    fn derive_file_key(&self, password: &[u8]) -> Vec<u8> {
        let mut input = Vec::with_capacity(32 + self.owner_entry.len() + 8 + self.file_id.len());
        input.extend_from_slice(&pad_password(password));
        input.extend_from_slice(&self.owner_entry[..32]);
        input.extend_from_slice(&self.permissions.to_le_bytes());
        input.extend_from_slice(&self.file_id);
        if self.revision >= 4 && !self.encrypt_metadata {
            input.extend_from_slice(&[0xFF; 4]);
        }

        let mut digest = md5_sum(&input).to_vec();
        if self.revision >= 3 {
            for _ in 0..50 {
                digest = md5_sum(&digest[..self.key_len]).to_vec();
            }
        }
        digest[..self.key_len].to_vec()
    }

    fn owner_key(&self, owner_password: &[u8]) -> Vec<u8> {
        let mut digest = md5_sum(&pad_password(owner_password)).to_vec();
        if self.revision >= 3 {
            for _ in 0..50 {
                digest = md5_sum(&digest[..self.key_len]).to_vec();
            }
        }
        digest[..self.key_len].to_vec()
    }

    /// First 16 bytes of `/U` for revisions 3 and 4.
    fn user_check_value(&self, file_key: &[u8]) -> Result<Vec<u8>, PdfEditError> {
        let mut input = Vec::with_capacity(32 + self.file_id.len());
        input.extend_from_slice(&PASSWORD_PADDING);
        input.extend_from_slice(&self.file_id);

        let mut value = md5_sum(&input).to_vec();
        for i in 0..=19u8 {
            rc4_apply(&xor_key(file_key, i), &mut value)?;
        }
        Ok(value)
    }

    fn validates_user_key(&self, file_key: &[u8]) -> bool {
        if self.revision == 2 {
            let mut value = PASSWORD_PADDING.to_vec();
            return rc4_apply(file_key, &mut value).is_ok()
                && self.user_entry.len() >= 32
                && value == self.user_entry[..32];
        }
        match self.user_check_value(file_key) {
            Ok(value) => value[..] == self.user_entry[..16],
            Err(_) => false,
        }
    }

    fn owner_password_to_user_password(
        &self,
        owner_password: &[u8],
    ) -> Result<Vec<u8>, PdfEditError> {
        let owner_key = self.owner_key(owner_password);
        let mut value = self.owner_entry[..32].to_vec();
        if self.revision == 2 {
            rc4_apply(&owner_key, &mut value)?;
            return Ok(value);
        }
        for i in (0..=19u8).rev() {
            rc4_apply(&xor_key(&owner_key, i), &mut value)?;
        }
        Ok(value)
    }

    fn object_key(&self, file_key: &[u8], cipher: Cipher, (number, generation): ObjectId) -> Vec<u8> {
        if cipher == Cipher::Aes256 {
            return file_key.to_vec();
        }
        let mut material = Vec::with_capacity(file_key.len() + 9);
        material.extend_from_slice(file_key);
        material.extend_from_slice(&number.to_le_bytes()[..3]);
        material.extend_from_slice(&generation.to_le_bytes());
        if cipher == Cipher::Aes128 {
            material.extend_from_slice(b"sAlT");
        }
        let digest = md5_sum(&material);
        digest[..(file_key.len() + 5).min(16)].to_vec()
    }

    pub(crate) fn encrypt_dictionary(&self) -> Dictionary {
        let hex = |bytes: &[u8]| Object::String(bytes.to_vec(), StringFormat::Hexadecimal);
        dictionary! {
            "Filter" => "Standard",
            "V" => self.version,
            "R" => self.revision,
            "Length" => (self.key_len * 8) as i64,
            "CF" => dictionary! {
                "StdCF" => dictionary! {
                    "Type" => "CryptFilter",
                    "CFM" => "AESV3",
                    "AuthEvent" => "DocOpen",
                    "Length" => self.key_len as i64,
                },
            },
            "StmF" => "StdCF",
            "StrF" => "StdCF",
            "O" => hex(&self.owner_entry),
            "U" => hex(&self.user_entry),
            "OE" => hex(&self.owner_key_entry),
            "UE" => hex(&self.user_key_entry),
            "Perms" => hex(&self.perms_entry),
            "P" => self.permissions as i64,
            "EncryptMetadata" => self.encrypt_metadata,
        }
    }

    /// Run every string and stream of every object except `skip` through
    /// the document's ciphers. Returns the number of objects visited.
    pub(crate) fn transform_objects(
        &self,
        doc: &mut Document,
        file_key: &[u8],
        skip: Option<ObjectId>,
        direction: Direction,
    ) -> Result<usize, PdfEditError> {
        let mut count = 0;
        for (&id, object) in doc.objects.iter_mut() {
            if Some(id) == skip || self.is_exempt(object) {
                continue;
            }
            let keys = ObjectKeys {
                string: self.object_key(file_key, self.string_cipher, id),
                stream: self.object_key(file_key, self.stream_cipher, id),
            };
            self.transform(object, &keys, direction)?;
            count += 1;
        }
        Ok(count)
    }

    fn is_exempt(&self, object: &Object) -> bool {
        let Object::Stream(stream) = object else {
            return false;
        };
        match stream.dict.get(b"Type").and_then(Object::as_name) {
            Ok(b"XRef") => true,
            Ok(b"Metadata") => !self.encrypt_metadata,
            _ => false,
        }
    }

    fn transform(
        &self,
        object: &mut Object,
        keys: &ObjectKeys,
        direction: Direction,
    ) -> Result<(), PdfEditError> {
        match object {
            Object::String(bytes, format) => {
                *bytes = crypt(self.string_cipher, &keys.string, bytes, direction)?;
                if direction == Direction::Encrypt {
                    *format = StringFormat::Hexadecimal;
                }
            }
            Object::Array(items) => {
                for item in items.iter_mut() {
                    self.transform(item, keys, direction)?;
                }
            }
            Object::Dictionary(dict) => {
                for (_, value) in dict.iter_mut() {
                    self.transform(value, keys, direction)?;
                }
            }
            Object::Stream(stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    self.transform(value, keys, direction)?;
                }
                let content = crypt(self.stream_cipher, &keys.stream, &stream.content, direction)?;
                stream.set_content(content);
            }
            _ => {}
        }
        Ok(())
    }
}

struct ObjectKeys {
    string: Vec<u8>,
    stream: Vec<u8>,
}

fn unsupported(what: &str) -> PdfEditError {
    PdfEditError::Password(format!("Unsupported {}", what))
}

/// Cipher named by the `/StmF` or `/StrF` entry of a `/V 4` or `/V 5` dictionary.
fn crypt_filter(dict: &Dictionary, entry: &[u8]) -> Result<Cipher, PdfEditError> {
    let name = match dict.get(entry).and_then(Object::as_name) {
        Ok(name) => name,
        Err(_) => return Ok(Cipher::Identity),
    };
    if name == b"Identity" {
        return Ok(Cipher::Identity);
    }
    let method = dict
        .get(b"CF")
        .and_then(Object::as_dict)
        .and_then(|filters| filters.get(name))
        .and_then(Object::as_dict)
        .and_then(|filter| filter.get(b"CFM"))
        .and_then(Object::as_name)
        .map_err(|_| {
            PdfEditError::Format(format!(
                "Crypt filter /{} is not defined",
                String::from_utf8_lossy(name)
            ))
        })?;
    match method {
        b"None" => Ok(Cipher::Identity),
        b"V2" => Ok(Cipher::Rc4),
        b"AESV2" => Ok(Cipher::Aes128),
        b"AESV3" => Ok(Cipher::Aes256),
        other => Err(unsupported(&format!(
            "crypt filter method {}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Encrypt or decrypt one string or stream body. AES data carries its
/// 16-byte IV in front of the ciphertext.
fn crypt(
    cipher: Cipher,
    key: &[u8],
    data: &[u8],
    direction: Direction,
) -> Result<Vec<u8>, PdfEditError> {
    match (cipher, direction) {
        (Cipher::Identity, _) => Ok(data.to_vec()),
        (Cipher::Rc4, _) => {
            let mut out = data.to_vec();
            rc4_apply(key, &mut out)?;
            Ok(out)
        }
        (Cipher::Aes128 | Cipher::Aes256, Direction::Encrypt) => {
            let iv = random_bytes(AES_BLOCK);
            let mut buffer = iv.clone();
            let start = buffer.len();
            buffer.resize(start + (data.len() / AES_BLOCK + 1) * AES_BLOCK, 0);
            buffer[start..start + data.len()].copy_from_slice(data);
            let body = &mut buffer[start..];
            let written = if cipher == Cipher::Aes256 {
                Aes256CbcEnc::new_from_slices(key, &iv)
                    .map_err(|_| invalid_key())?
                    .encrypt_padded_mut::<Pkcs7>(body, data.len())
                    .map_err(|_| PdfEditError::Operation("AES encryption failed".into()))?
                    .len()
            } else {
                Aes128CbcEnc::new_from_slices(key, &iv)
                    .map_err(|_| invalid_key())?
                    .encrypt_padded_mut::<Pkcs7>(body, data.len())
                    .map_err(|_| PdfEditError::Operation("AES encryption failed".into()))?
                    .len()
            };
            buffer.truncate(start + written);
            Ok(buffer)
        }
        (Cipher::Aes128 | Cipher::Aes256, Direction::Decrypt) => {
            if data.is_empty() {
                return Ok(Vec::new());
            }
            if data.len() < 2 * AES_BLOCK || data.len() % AES_BLOCK != 0 {
                return Err(PdfEditError::Format(format!(
                    "AES data of {} bytes is not block aligned",
                    data.len()
                )));
            }
            let (iv, body) = data.split_at(AES_BLOCK);
            let mut buffer = body.to_vec();
            let plain = if cipher == Cipher::Aes256 {
                Aes256CbcDec::new_from_slices(key, iv)
                    .map_err(|_| invalid_key())?
                    .decrypt_padded_mut::<Pkcs7>(&mut buffer)
                    .map_err(|_| PdfEditError::Format("Bad AES padding".into()))?
                    .len()
            } else {
                Aes128CbcDec::new_from_slices(key, iv)
                    .map_err(|_| invalid_key())?
                    .decrypt_padded_mut::<Pkcs7>(&mut buffer)
                    .map_err(|_| PdfEditError::Format("Bad AES padding".into()))?
                    .len()
            };
            buffer.truncate(plain);
            Ok(buffer)
        }
    }
}

fn invalid_key() -> PdfEditError {
    PdfEditError::Operation("Invalid AES key".into())
}

/// AES-256-CBC over whole blocks, no padding. Used for `/UE`, `/OE` and
/// `/Perms`, which are block sized.
fn aes256_raw(
    key: &[u8],
    iv: &[u8],
    data: &[u8],
    direction: Direction,
) -> Result<Vec<u8>, PdfEditError> {
    if data.len() % AES_BLOCK != 0 {
        return Err(PdfEditError::Format("Key entry is not block aligned".into()));
    }
    let mut buffer = data.to_vec();
    let len = buffer.len();
    match direction {
        Direction::Encrypt => {
            Aes256CbcEnc::new_from_slices(key, iv)
                .map_err(|_| invalid_key())?
                .encrypt_padded_mut::<NoPadding>(&mut buffer, len)
                .map_err(|_| PdfEditError::Operation("AES encryption failed".into()))?;
        }
        Direction::Decrypt => {
            Aes256CbcDec::new_from_slices(key, iv)
                .map_err(|_| invalid_key())?
                .decrypt_padded_mut::<NoPadding>(&mut buffer)
                .map_err(|_| PdfEditError::Format("AES decryption failed".into()))?;
        }
    }
    Ok(buffer)
}

/// Iterated SHA-2 password hash of revision 6.
fn hardened_hash(
    password: &[u8],
    salt: &[u8],
    user_data: &[u8],
) -> Result<Vec<u8>, PdfEditError> {
    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.update(user_data);
    let mut k = hasher.finalize().to_vec();

    let mut round = 0usize;
    loop {
        let mut block = Vec::with_capacity(64 * (password.len() + k.len() + user_data.len()));
        for _ in 0..64 {
            block.extend_from_slice(password);
            block.extend_from_slice(&k);
            block.extend_from_slice(user_data);
        }
        let len = block.len();
        Aes128CbcEnc::new_from_slices(&k[..16], &k[16..32])
            .map_err(|_| invalid_key())?
            .encrypt_padded_mut::<NoPadding>(&mut block, len)
            .map_err(|_| PdfEditError::Operation("AES encryption failed".into()))?;

        let selector = block[..16].iter().map(|&b| u32::from(b)).sum::<u32>() % 3;
        k = match selector {
            0 => Sha256::digest(&block).to_vec(),
            1 => Sha384::digest(&block).to_vec(),
            _ => Sha512::digest(&block).to_vec(),
        };

        round += 1;
        let last = usize::from(block[len - 1]);
        if round >= 64 && last + 32 <= round {
            break;
        }
    }
    k.truncate(32);
    Ok(k)
}

fn utf8_password(password: &[u8]) -> &[u8] {
    if password.len() <= MAX_UTF8_PASSWORD {
        return password;
    }
    let mut end = MAX_UTF8_PASSWORD;
    while end > 0 && (password[end] & 0xC0) == 0x80 {
        end -= 1;
    }
    &password[..end]
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut out = PASSWORD_PADDING;
    let copy_len = password.len().min(32);
    out[..copy_len].copy_from_slice(&password[..copy_len]);
    out
}

fn md5_sum(data: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(data);
    let mut out = [0u8; 16];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Random bytes from v4 UUIDs.
fn random_bytes(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + 16);
    while out.len() < len {
        out.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    }
    out.truncate(len);
    out
}

fn xor_key(key: &[u8], value: u8) -> Vec<u8> {
    key.iter().map(|b| b ^ value).collect()
}

fn rc4_apply(key: &[u8], data: &mut [u8]) -> Result<(), PdfEditError> {
    match key.len() {
        5 => rc4_apply_sized::<rc4::consts::U5>(key, data),
        6 => rc4_apply_sized::<rc4::consts::U6>(key, data),
        7 => rc4_apply_sized::<rc4::consts::U7>(key, data),
        8 => rc4_apply_sized::<rc4::consts::U8>(key, data),
        9 => rc4_apply_sized::<rc4::consts::U9>(key, data),
        10 => rc4_apply_sized::<rc4::consts::U10>(key, data),
        11 => rc4_apply_sized::<rc4::consts::U11>(key, data),
        12 => rc4_apply_sized::<rc4::consts::U12>(key, data),
        13 => rc4_apply_sized::<rc4::consts::U13>(key, data),
        14 => rc4_apply_sized::<rc4::consts::U14>(key, data),
        15 => rc4_apply_sized::<rc4::consts::U15>(key, data),
        16 => rc4_apply_sized::<rc4::consts::U16>(key, data),
        other => Err(PdfEditError::Format(format!(
            "Unsupported RC4 key length {}",
            other
        ))),
    }
}

fn rc4_apply_sized<K>(key: &[u8], data: &mut [u8]) -> Result<(), PdfEditError>
where
    Rc4<K>: KeyInit + StreamCipher,
{
    let mut cipher = Rc4::<K>::new_from_slice(key)
        .map_err(|_| PdfEditError::Operation("Invalid RC4 key".into()))?;
    cipher.apply_keystream(data);
    Ok(())
}
