//! Translation catalogs for user-facing messages.
//!
//! Messages are looked up by key in the active language's table and fall
//! back to English when a translation is missing. Placeholders use the
//! `{name}` form and are filled by [`Catalog::format`].

use crate::models::Language;
use indexmap::IndexMap;
use std::sync::LazyLock;

/// Message keys
pub mod msg {
    pub const EMPTY_INPUT: &str = "empty_input";
    pub const INVALID_SIZE: &str = "invalid_size";
    pub const INVALID_PHONE: &str = "invalid_phone";
    pub const INVALID_EMAIL: &str = "invalid_email";
    pub const INVALID_URL: &str = "invalid_url";
    pub const ENCODE_FAILED: &str = "encode_failed";
    pub const GENERATED: &str = "generated";
    pub const BUSY: &str = "busy";
    pub const CANCELLED: &str = "cancelled";
    pub const NO_RESULT: &str = "no_result";
    pub const DOWNLOADED: &str = "downloaded";
    pub const DOWNLOAD_FAILED: &str = "download_failed";
    pub const SHARED: &str = "shared";
    pub const COPIED: &str = "copied";
    pub const SHARE_UNAVAILABLE: &str = "share_unavailable";
    pub const HISTORY_CLEARED: &str = "history_cleared";
    pub const HISTORY_EMPTY: &str = "history_empty";
    pub const HISTORY_NOT_FOUND: &str = "history_not_found";
    pub const STATS_RESET: &str = "stats_reset";
    pub const THEME_CHANGED: &str = "theme_changed";
    pub const LANGUAGE_CHANGED: &str = "language_changed";
    pub const STATS_SUMMARY: &str = "stats_summary";
    pub const PROMPT: &str = "prompt";
}

type Table = IndexMap<&'static str, &'static str>;

static EN: LazyLock<Table> = LazyLock::new(|| {
    IndexMap::from([
        (msg::EMPTY_INPUT, "Please enter some text to generate a QR code."),
        (msg::INVALID_SIZE, "Size must be between 1 and {max} pixels."),
        (msg::INVALID_PHONE, "Please enter a valid phone number."),
        (msg::INVALID_EMAIL, "Please enter a valid email address."),
        (msg::INVALID_URL, "Please enter a valid URL."),
        (msg::ENCODE_FAILED, "Could not generate the QR code. Try shorter text or a lower error-correction level."),
        (msg::GENERATED, "QR code generated!"),
        (msg::BUSY, "A QR code is already being generated."),
        (msg::CANCELLED, "Generation cancelled."),
        (msg::NO_RESULT, "Generate a QR code first."),
        (msg::DOWNLOADED, "Saved to {path}"),
        (msg::DOWNLOAD_FAILED, "Could not save the QR code."),
        (msg::SHARED, "Shared!"),
        (msg::COPIED, "Copied to clipboard!"),
        (msg::SHARE_UNAVAILABLE, "Sharing is not available here."),
        (msg::HISTORY_CLEARED, "History cleared."),
        (msg::HISTORY_EMPTY, "No QR codes in history yet."),
        (msg::HISTORY_NOT_FOUND, "History entry not found."),
        (msg::STATS_RESET, "Statistics reset."),
        (msg::THEME_CHANGED, "Theme: {theme}"),
        (msg::LANGUAGE_CHANGED, "Language: {language}"),
        (msg::STATS_SUMMARY, "Generated: {generated} · Downloaded: {downloaded} · In history: {history}"),
        (msg::PROMPT, "Enter text (:help for commands)"),
    ])
});

static ES: LazyLock<Table> = LazyLock::new(|| {
    IndexMap::from([
        (msg::EMPTY_INPUT, "Por favor, introduce un texto para generar el código QR."),
        (msg::INVALID_SIZE, "El tamaño debe estar entre 1 y {max} píxeles."),
        (msg::INVALID_PHONE, "Por favor, introduce un número de teléfono válido."),
        (msg::INVALID_EMAIL, "Por favor, introduce un correo electrónico válido."),
        (msg::INVALID_URL, "Por favor, introduce una URL válida."),
        (msg::ENCODE_FAILED, "No se pudo generar el código QR. Prueba con un texto más corto o un nivel de corrección menor."),
        (msg::GENERATED, "¡Código QR generado!"),
        (msg::BUSY, "Ya se está generando un código QR."),
        (msg::CANCELLED, "Generación cancelada."),
        (msg::NO_RESULT, "Primero genera un código QR."),
        (msg::DOWNLOADED, "Guardado en {path}"),
        (msg::DOWNLOAD_FAILED, "No se pudo guardar el código QR."),
        (msg::SHARED, "¡Compartido!"),
        (msg::COPIED, "¡Copiado al portapapeles!"),
        (msg::SHARE_UNAVAILABLE, "Compartir no está disponible aquí."),
        (msg::HISTORY_CLEARED, "Historial borrado."),
        (msg::HISTORY_EMPTY, "Todavía no hay códigos QR en el historial."),
        (msg::HISTORY_NOT_FOUND, "Entrada del historial no encontrada."),
        (msg::STATS_RESET, "Estadísticas reiniciadas."),
        (msg::THEME_CHANGED, "Tema: {theme}"),
        (msg::LANGUAGE_CHANGED, "Idioma: {language}"),
        (msg::STATS_SUMMARY, "Generados: {generated} · Descargados: {downloaded} · En historial: {history}"),
        (msg::PROMPT, "Introduce texto (:help para ver los comandos)"),
    ])
});

static FR: LazyLock<Table> = LazyLock::new(|| {
    IndexMap::from([
        (msg::EMPTY_INPUT, "Veuillez saisir du texte pour générer un code QR."),
        (msg::INVALID_SIZE, "La taille doit être comprise entre 1 et {max} pixels."),
        (msg::INVALID_PHONE, "Veuillez saisir un numéro de téléphone valide."),
        (msg::INVALID_EMAIL, "Veuillez saisir une adresse e-mail valide."),
        (msg::INVALID_URL, "Veuillez saisir une URL valide."),
        (msg::ENCODE_FAILED, "Impossible de générer le code QR. Essayez un texte plus court ou un niveau de correction plus bas."),
        (msg::GENERATED, "Code QR généré !"),
        (msg::BUSY, "Un code QR est déjà en cours de génération."),
        (msg::CANCELLED, "Génération annulée."),
        (msg::NO_RESULT, "Générez d'abord un code QR."),
        (msg::DOWNLOADED, "Enregistré dans {path}"),
        (msg::DOWNLOAD_FAILED, "Impossible d'enregistrer le code QR."),
        (msg::SHARED, "Partagé !"),
        (msg::COPIED, "Copié dans le presse-papiers !"),
        (msg::SHARE_UNAVAILABLE, "Le partage n'est pas disponible ici."),
        (msg::HISTORY_CLEARED, "Historique effacé."),
        (msg::HISTORY_EMPTY, "Aucun code QR dans l'historique."),
        (msg::HISTORY_NOT_FOUND, "Entrée d'historique introuvable."),
        (msg::STATS_RESET, "Statistiques réinitialisées."),
        (msg::THEME_CHANGED, "Thème : {theme}"),
        (msg::LANGUAGE_CHANGED, "Langue : {language}"),
        (msg::STATS_SUMMARY, "Générés : {generated} · Téléchargés : {downloaded} · Dans l'historique : {history}"),
        (msg::PROMPT, "Saisissez du texte (:help pour les commandes)"),
    ])
});

/// Message lookup for one language.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    language: Language,
}

impl Catalog {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    fn table(language: Language) -> &'static Table {
        match language {
            Language::En => &*EN,
            Language::Es => &*ES,
            Language::Fr => &*FR,
        }
    }

    /// Translated message for `key`, falling back to English and then to the key itself.
    pub fn get(&self, key: &'static str) -> &'static str {
        Self::table(self.language)
            .get(key)
            .or_else(|| EN.get(key))
            .copied()
            .unwrap_or(key)
    }

    /// Translated message with `{name}` placeholders replaced.
    pub fn format(&self, key: &'static str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.get(key).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_covers_english_keys() {
        for language in Language::ALL {
            let table = Catalog::table(language);
            for key in EN.keys() {
                assert!(
                    table.contains_key(key),
                    "{} is missing translation for {}",
                    language,
                    key
                );
            }
        }
    }

    #[test]
    fn test_lookup_in_active_language() {
        assert_eq!(Catalog::new(Language::Es).get(msg::SHARED), "¡Compartido!");
        assert_eq!(Catalog::new(Language::Fr).get(msg::SHARED), "Partagé !");
    }

    #[test]
    fn test_unknown_key_returns_key() {
        assert_eq!(Catalog::new(Language::En).get("nope"), "nope");
    }

    #[test]
    fn test_format_placeholders() {
        let text = Catalog::new(Language::En).format(msg::DOWNLOADED, &[("path", "/tmp/qr.png")]);
        assert_eq!(text, "Saved to /tmp/qr.png");

        let summary = Catalog::new(Language::En).format(
            msg::STATS_SUMMARY,
            &[("generated", "2"), ("downloaded", "1"), ("history", "1")],
        );
        assert_eq!(summary, "Generated: 2 · Downloaded: 1 · In history: 1");
    }
}
