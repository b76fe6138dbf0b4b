// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use energy_report_i18n::Language;

/// System prompt and user instruction for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompts {
    pub system: &'static str,
    pub instruction: &'static str,
}

const FRENCH: Prompts = Prompts {
    system: "Tu es un consultant énergie expert des environnements industriels et tertiaires. \
             Tes recommandations doivent être professionnelles, actionnables et adaptées à un public B2B. \
             Rédige systématiquement ta réponse en français.",
    instruction: "Conclusion du rapport ci-dessous. Formule un conseil professionnel, orienté B2B, \
                  en t’appuyant sur les constats fournis.",
};

const ENGLISH: Prompts = Prompts {
    system: "You are an energy management consultant supporting industrial and commercial clients. \
             Your recommendations must stay professional, actionable, and tailored for B2B decision makers. \
             Always answer in English.",
    instruction: "The following report conclusion summarises the situation. Provide a professional, \
                  B2B-oriented piece of advice based on it.",
};

const DUTCH: Prompts = Prompts {
    system: "Je bent een energieconsultant voor zakelijke omgevingen en grote gebouwen. \
             Je adviezen moeten professioneel, uitvoerbaar en gericht op een B2B-publiek zijn. \
             Antwoord altijd in het Nederlands.",
    instruction: "Onderstaande conclusie vat het rapport samen. Formuleer één professioneel \
                  B2B-advies op basis daarvan.",
};

impl Prompts {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::French => FRENCH,
            Language::English => ENGLISH,
            Language::Dutch => DUTCH,
        }
    }

    /// Unknown codes get the French prompts
    pub fn for_code(code: &str) -> Self {
        Self::for_language(Language::from_code_or_default(code))
    }
}

pub fn user_message(conclusion: &str, instruction: &str) -> String {
    format!("Conclusion :\n{conclusion}\n\nInstruction : {instruction}")
}
