//! Sign-up payload and the checks run on it before it is sent.

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "edad")]
    pub age: u32,
    #[serde(rename = "documento_identidad")]
    pub document_id: String,
    #[serde(rename = "telefono")]
    pub phone: String,
}

const MIN_NAME_LENGTH: usize = 2;
const MIN_PASSWORD_LENGTH: usize = 6;
const MIN_AGE: u32 = 18;
const MAX_AGE: u32 = 99;
const MIN_PHONE_DIGITS: usize = 10;

/// A field that failed validation, with the message shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Registration {
    /// Check every field, returning all failures at once.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut fail = |field, message| errors.push(FieldError { field, message });

        if self.name.trim().is_empty() {
            fail("nombre", "Nombre es requerido");
        } else if self.name.chars().count() < MIN_NAME_LENGTH {
            fail("nombre", "Mínimo 2 caracteres");
        }

        if self.email.is_empty() {
            fail("email", "Email es requerido");
        } else if !looks_like_email(&self.email) {
            fail("email", "Email inválido");
        }

        if self.password.is_empty() {
            fail("password", "Contraseña es requerida");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            fail("password", "Mínimo 6 caracteres");
        }

        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            fail("edad", "Edad entre 18-99 años");
        }

        let document_digits = digits(&self.document_id);
        if self.document_id.is_empty() {
            fail("documento_identidad", "DNI es requerido");
        } else if !(7..=8).contains(&document_digits) {
            fail("documento_identidad", "DNI: 7-8 dígitos");
        }

        if self.phone.is_empty() {
            fail("telefono", "Teléfono es requerido");
        } else if digits(&self.phone) < MIN_PHONE_DIGITS {
            fail("telefono", "Teléfono inválido");
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn digits(s: &str) -> usize {
    s.chars().filter(char::is_ascii_digit).count()
}

/// Contains `x@y.z`, where each part is a run of non-whitespace characters.
///
/// The match is not anchored: `a b@c.de` passes because `b@c.de` does. This
/// is the same check the sign-up form runs, so both accept the same input.
fn looks_like_email(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    chars.iter().enumerate().any(|(at, &c)| {
        if c != '@' || at == 0 || chars[at - 1].is_whitespace() {
            return false;
        }
        let domain: Vec<char> = chars[at + 1..]
            .iter()
            .copied()
            .take_while(|c| !c.is_whitespace())
            .collect();
        domain
            .iter()
            .enumerate()
            .any(|(dot, &c)| c == '.' && dot > 0 && dot + 1 < domain.len())
    })
}
