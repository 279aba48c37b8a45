//! Static tables describing a family of wikis.

use crate::{Error, Result};

type PerCode = &'static [(&'static str, &'static [&'static str])];

/// A family of wikis sharing one naming scheme, such as Wikipedia.
#[derive(Debug)]
pub struct Family {
    pub name: &'static str,
    /// `{code}.{domain}` is the host of each wiki.
    pub domain: &'static str,
    pub languages_by_size: &'static [&'static str],
    pub test_codes: &'static [&'static str],
    pub closed_wikis: &'static [&'static str],
    pub removed_wikis: &'static [&'static str],
    /// Languages on which global bots may edit.
    pub cross_allowed: &'static [&'static str],
    /// Languages that used to be coded in iso-8859-1.
    pub latin1old: &'static [&'static str],
    category_redirect_templates: PerCode,
    edit_restricted_templates: PerCode,
    archived_page_templates: PerCode,
    doc_subpages: PerCode,
    doc_subpages_default: (&'static [&'static str], &'static [&'static str]),
}

static FAMILIES: &[&Family] = &[&WIKIPEDIA];

impl Family {
    pub fn load(name: &str) -> Result<&'static Family> {
        FAMILIES
            .iter()
            .copied()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::UnknownFamily(name.to_owned()))
    }

    /// Every code with a wiki, open or closed.
    pub fn codes(&self) -> impl Iterator<Item = &'static str> {
        self.languages_by_size
            .iter()
            .chain(self.closed_wikis)
            .chain(self.test_codes)
            .copied()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.codes().any(|c| c == code)
    }

    pub fn is_closed(&self, code: &str) -> bool {
        self.closed_wikis.contains(&code)
    }

    pub fn is_removed(&self, code: &str) -> bool {
        self.removed_wikis.contains(&code)
    }

    /// Whether `prefix` in `[[prefix:Title]]` is an interlanguage link.
    pub fn is_interwiki_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.trim().to_lowercase();
        self.languages_by_size
            .iter()
            .chain(self.closed_wikis)
            .any(|c| *c == prefix)
    }

    pub fn hostname(&self, code: &str) -> String {
        format!("{code}.{}", self.domain)
    }

    pub fn api_url(&self, code: &str) -> String {
        format!("https://{}/w/api.php", self.hostname(code))
    }

    pub fn article_url(&self, code: &str, title: &str) -> String {
        let title = title.trim().replace(' ', "_");
        let encoded = urlencoding::encode(&title)
            .replace("%2F", "/")
            .replace("%3A", ":");
        format!("https://{}/wiki/{encoded}", self.hostname(code))
    }

    pub fn encodings(&self, code: &str) -> &'static [&'static str] {
        match code {
            "pl" => &["utf-8", "iso8859-2"],
            "ru" => &["utf-8", "iso8859-5"],
            c if self.latin1old.contains(&c) => &["utf-8", "iso-8859-1"],
            _ => &["utf-8"],
        }
    }

    pub fn category_redirect_templates(&self, code: &str) -> &'static [&'static str] {
        lookup(self.category_redirect_templates, code)
    }

    pub fn edit_restricted_templates(&self, code: &str) -> &'static [&'static str] {
        lookup(self.edit_restricted_templates, code)
    }

    pub fn archived_page_templates(&self, code: &str) -> &'static [&'static str] {
        lookup(self.archived_page_templates, code)
    }

    pub fn doc_subpages(&self, code: &str) -> &'static [&'static str] {
        if let Some((_, pages)) = self.doc_subpages.iter().find(|(c, _)| *c == code) {
            return *pages;
        }
        let (pages, codes) = self.doc_subpages_default;
        if codes.contains(&code) {
            pages
        } else {
            &[]
        }
    }
}

fn lookup(table: PerCode, code: &str) -> &'static [&'static str] {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, v)| *v)
        .unwrap_or_default()
}

pub static WIKIPEDIA: Family = Family {
    name: "wikipedia",
    domain: "wikipedia.org",
    languages_by_size: &[
        "en", "ceb", "sv", "de", "fr", "nl", "ru", "es", "it", "pl", "arz",
        "ja", "vi", "war", "zh", "ar", "uk", "pt", "fa", "ca", "sr", "id",
        "no", "ko", "fi", "hu", "cs", "sh", "tr", "ce", "zh-min-nan", "ro",
        "eu", "ms", "tt", "eo", "he", "hy", "bg", "da", "azb", "sk", "kk",
        "min", "et", "be", "hr", "lt", "el", "simple", "az", "gl", "sl", "ur",
        "nn", "ka", "hi", "th", "ta", "uz", "la", "cy", "ast", "vo", "zh-yue",
        "mk", "bn", "lv", "tg", "my", "af", "mg", "bs", "oc", "sq", "nds",
        "mr", "ky", "ml", "be-tarask", "te", "new", "br", "vec", "sw", "pms",
        "jv", "pnb", "ht", "su", "lb", "ba", "ga", "szl", "is", "ku", "lmo",
        "fy", "cv", "tl", "wuu", "an", "sco", "diq", "pa", "ckb", "yo", "ne",
        "bar", "io", "gu", "als", "kn", "scn", "bpy", "ia", "qu", "mn", "xmf",
        "nv", "avk", "si", "bat-smg", "or", "gd", "cdo", "ilo", "yi", "am",
        "sd", "bug", "nap", "frr", "os", "hsb", "map-bms", "mai", "fo", "crh",
        "li", "ha", "sah", "mzn", "eml", "ps", "ace", "gor", "sa", "bcl", "wa",
        "zh-classical", "lij", "ban", "zu", "mhr", "mrj", "hif", "shn", "mni",
        "as", "hak", "roa-tara", "hyw", "pam", "ie", "nso", "km", "rue", "se",
        "bh", "vls", "nds-nl", "sn", "so", "mi", "nah", "sat", "sc", "myv",
        "vep", "gan", "glk", "kab", "tk", "co", "fiu-vro", "bo", "ab", "kv",
        "csb", "pcd", "frp", "ug", "udm", "kw", "gv", "ay", "ary", "zea",
        "nrm", "gn", "bjn", "mt", "lez", "lfn", "stq", "lo", "mwl", "skr",
        "smn", "rm", "olo", "lad", "gom", "ang", "fur", "koi", "tyv", "ext",
        "dsb", "dty", "ln", "cbk-zam", "dv", "ksh", "rw", "gag", "bxr", "pfl",
        "ig", "av", "pi", "pag", "awa", "haw", "tay", "pap", "xal", "krc",
        "szy", "za", "pdc", "kaa", "inh", "atj", "arc", "to", "kbp", "tpi",
        "jam", "na", "wo", "lld", "kbd", "tcy", "mdf", "nov", "ki", "tet",
        "lg", "bi", "jbo", "roa-rup", "fj", "kg", "lbe", "xh", "ty", "tw",
        "mnw", "nqo", "srn", "om", "shi", "trv", "gcr", "sm", "chr", "ltg",
        "alt", "ks", "nia", "pih", "ny", "dag", "got", "cu", "st", "mad",
        "ami", "kl", "tn", "bm", "ts", "rmy", "ve", "chy", "rn", "tum", "iu",
        "ss", "ch", "ak", "pnt", "ady", "ik", "ee", "ff", "din", "sg", "dz",
        "ti", "pwn", "cr",
    ],
    test_codes: &["test", "test2"],
    closed_wikis: &[
        "aa", "cho", "ho", "hz", "ii", "kj", "kr", "lrc", "mh", "mus", "ng", "ten",
    ],
    removed_wikis: &["dk", "ru-sib", "tlh", "tokipona", "zh_cn", "zh_tw"],
    cross_allowed: &[
        "ab", "ace", "ady", "af", "ak", "als", "am", "an", "ang", "ar", "arc",
        "arz", "as", "ast", "atj", "av", "ay", "az", "ba", "bar", "bat-smg",
        "bcl", "be", "be-tarask", "bg", "bh", "bi", "bjn", "bm", "bo", "bpy",
        "bug", "bxr", "ca", "cbk-zam", "cdo", "ce", "ceb", "ch", "chr", "chy",
        "ckb", "co", "cr", "crh", "cs", "csb", "cu", "cv", "cy", "da", "diq",
        "dsb", "dty", "dz", "ee", "el", "eml", "en", "eo", "et", "eu", "ext",
        "fa", "ff", "fi", "fj", "fo", "frp", "frr", "fur", "ga", "gag", "gan",
        "gd", "glk", "gn", "gom", "gor", "got", "gu", "gv", "ha", "hak", "haw",
        "he", "hi", "hif", "hr", "hsb", "ht", "hu", "hy", "ia", "ie", "ig",
        "ik", "ilo", "inh", "io", "iu", "ja", "jam", "jbo", "jv", "ka", "kaa",
        "kab", "kbd", "kg", "ki", "kk", "kl", "km", "kn", "ko", "koi", "krc",
        "ks", "ku", "kv", "kw", "ky", "la", "lad", "lb", "lbe", "lez", "lfn",
        "lg", "li", "lij", "lmo", "ln", "lo", "lt", "ltg", "lv", "map-bms",
        "mdf", "meta", "mg", "mhr", "mi", "mk", "ml", "mn", "mrj", "ms", "mwl",
        "my", "myv", "mzn", "na", "nah", "nap", "nds-nl", "ne", "new", "nl",
        "no", "nov", "nrm", "nso", "nv", "ny", "oc", "olo", "om", "or", "os",
        "pa", "pag", "pam", "pap", "pdc", "pfl", "pi", "pih", "pms", "pnb",
        "pnt", "ps", "qu", "rm", "rmy", "rn", "roa-rup", "roa-tara", "ru",
        "rue", "rw", "sa", "sah", "sc", "scn", "sco", "sd", "se", "sg", "sh",
        "shn", "si", "simple", "sk", "sm", "sn", "so", "srn", "ss", "st",
        "stq", "su", "sv", "sw", "szl", "ta", "tcy", "te", "tet", "tg", "th",
        "ti", "tk", "tl", "tn", "to", "tpi", "tr", "ts", "tt", "tum", "tw",
        "ty", "tyv", "udm", "ug", "uz", "ve", "vec", "vep", "vls", "vo", "wa",
        "war", "wo", "xal", "xh", "xmf", "yi", "yo", "za", "zea", "zh",
        "zh-classical", "zh-min-nan", "zh-yue", "zu",
    ],
    latin1old: &[
        "af", "bs", "co", "cs", "da", "de", "en", "es", "et", "eu", "fi", "fr",
        "fy", "ga", "gl", "ia", "id", "it", "la", "lt", "lv", "mi", "mr", "na",
        "nds", "nl", "no", "pt", "simple", "sl", "sv", "sw", "test", "tt",
        "uk", "vi", "vo",
    ],
    category_redirect_templates: &[
        ("ar", &["تحويل تصنيف"]),
        ("ary", &["Category redirect"]),
        ("arz", &["تحويل تصنيف"]),
        ("bn", &["বিষয়শ্রেণী পুনর্নির্দেশ"]),
        ("bs", &["Category redirect"]),
        ("cs", &["Zastaralá kategorie"]),
        ("da", &["Kategoriomdirigering"]),
        ("en", &["Category redirect"]),
        ("es", &["Categoría redirigida"]),
        ("eu", &["Kategoria birzuzendu"]),
        ("fa", &["رده بهتر"]),
        ("fr", &["Catégorie redirigée"]),
        ("gv", &["Aastiurey ronney"]),
        ("hi", &["श्रेणी अनुप्रेषित"]),
        ("hu", &["Kat-redir"]),
        ("id", &["Alih kategori"]),
        ("ja", &["Category redirect"]),
        ("ko", &["분류 넘겨주기"]),
        ("mk", &["Премести категорија"]),
        ("ml", &["Category redirect"]),
        ("ms", &["Pengalihan kategori"]),
        ("mt", &["Rindirizzament kategorija"]),
        ("ne", &["श्रेणी अनुप्रेषण"]),
        ("no", &["Kategoriomdirigering"]),
        ("pt", &["Redirecionamento de categoria"]),
        ("ro", &["Redirect categorie"]),
        ("ru", &["Переименованная категория"]),
        ("sco", &["Category redirect"]),
        ("sh", &["Prekat"]),
        ("simple", &["Category redirect"]),
        ("sl", &["Preusmeritev kategorije"]),
        ("sr", &["Category redirect"]),
        ("sq", &["Kategori e zhvendosur"]),
        ("sv", &["Kategoriomdirigering"]),
        ("tl", &["Category redirect"]),
        ("tr", &["Kategori yönlendirme"]),
        ("uk", &["Categoryredirect"]),
        ("ur", &["زمرہ رجوع مکرر"]),
        ("vi", &["Đổi hướng thể loại"]),
        ("yi", &["קאטעגאריע אריבערפירן"]),
        ("zh", &["分类重定向"]),
        ("zh-yue", &["分類彈去"]),
    ],
    edit_restricted_templates: &[
        ("ar", &["تحرر"]),
        ("ary", &["كاتبدل دابا"]),
        ("arz", &["بتتطور"]),
        ("bs", &["Izmjena u toku"]),
        ("cs", &["Pracuje se"]),
        ("de", &["Inuse", "In use", "In bearbeitung", "Inbearbeitung"]),
        ("en", &["Inuse", "In use"]),
        ("fa", &["ویرایش"]),
        ("fr", &["En cours"]),
        ("he", &["בעבודה"]),
        ("hr", &["Radovi"]),
        ("hy", &["Խմբագրում եմ"]),
        ("sr", &["Радови у току", "Рут"]),
        ("test", &["In use"]),
        ("ur", &["زیر ترمیم"]),
        ("zh", &["Inuse"]),
    ],
    archived_page_templates: &[
        ("ar", &["أرشيف نقاش"]),
        ("arz", &["صفحة ارشيف"]),
        (
            "cs",
            &[
                "Archiv",
                "Archiv Wikipedie",
                "Archiv diskuse",
                "Archivace start",
                "Posloupnost archivů",
                "Rfa-archiv-start",
                "Rfc-archiv-start",
            ],
        ),
        ("de", &["Archiv"]),
    ],
    doc_subpages: &[
        ("ar", &["/شرح", "/doc"]),
        ("ary", &["/توثيق", "/شرح", "/doc"]),
        ("bs", &["/dok"]),
        ("ca", &["/ús"]),
        ("de", &["Doku", "/Meta"]),
        ("dsb", &["/Dokumentacija"]),
        ("eu", &["txantiloi dokumentazioa", "/dok"]),
        ("fa", &["/doc", "/توضیحات"]),
        ("fi", &[]),
        ("fr", &["/Documentation"]),
        ("hsb", &["/Dokumentacija"]),
        ("it", &["/Man"]),
        ("ka", &["/ინფო"]),
        ("ko", &["/설명문서"]),
        ("no", &["/dok"]),
        ("nn", &["/dok"]),
        ("pl", &["/opis"]),
        ("sk", &["/Dokumentácia"]),
        ("sr", &["/док"]),
        ("sv", &["/dok"]),
        ("uk", &["/Документація"]),
        ("ur", &["/doc", "/دستاویز"]),
    ],
    doc_subpages_default: (
        &["/doc"],
        &[
            "arz", "bn", "cs", "da", "en", "es", "hr", "hu", "id", "ilo", "ja", "ms", "pt", "ro",
            "ru", "simple", "sh", "vi", "zh",
        ],
    ),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load() {
        let f = Family::load("wikipedia").unwrap();
        assert_eq!(f.name, "wikipedia");
        assert!(matches!(
            Family::load("wiktionary-but-not-really"),
            Err(Error::UnknownFamily(_))
        ));
    }

    #[test]
    fn codes() {
        let f = &WIKIPEDIA;
        assert!(f.has_code("en"));
        assert!(f.has_code("test2"));
        assert!(f.has_code("aa"));
        assert!(!f.has_code("tlh"));
        assert!(f.is_closed("aa"));
        assert!(!f.is_closed("en"));
        assert!(f.is_removed("zh_cn"));
        assert_eq!(f.codes().next(), Some("en"));
    }

    #[test]
    fn urls() {
        let f = &WIKIPEDIA;
        assert_eq!(f.hostname("de"), "de.wikipedia.org");
        assert_eq!(f.api_url("test"), "https://test.wikipedia.org/w/api.php");
        assert_eq!(
            f.article_url("en", "Main Page"),
            "https://en.wikipedia.org/wiki/Main_Page"
        );
        assert_eq!(
            f.article_url("en", "User talk:Foo/bar"),
            "https://en.wikipedia.org/wiki/User_talk:Foo/bar"
        );
    }

    #[test]
    fn encodings() {
        let f = &WIKIPEDIA;
        assert_eq!(f.encodings("pl"), ["utf-8", "iso8859-2"]);
        assert_eq!(f.encodings("ru"), ["utf-8", "iso8859-5"]);
        assert_eq!(f.encodings("de"), ["utf-8", "iso-8859-1"]);
        assert_eq!(f.encodings("ja"), ["utf-8"]);
    }

    #[test]
    fn per_code_tables() {
        let f = &WIKIPEDIA;
        assert_eq!(f.category_redirect_templates("en"), ["Category redirect"]);
        assert!(f.category_redirect_templates("xx").is_empty());
        assert_eq!(f.edit_restricted_templates("en"), ["Inuse", "In use"]);
        assert_eq!(f.archived_page_templates("de"), ["Archiv"]);
        assert_eq!(f.doc_subpages("en"), ["/doc"]);
        assert_eq!(f.doc_subpages("pl"), ["/opis"]);
        assert!(f.doc_subpages("fi").is_empty());
        assert!(f.doc_subpages("ceb").is_empty());
    }

    #[test]
    fn interwiki_prefixes() {
        let f = &WIKIPEDIA;
        assert!(f.is_interwiki_prefix("de"));
        assert!(f.is_interwiki_prefix("zh-min-nan"));
        assert!(f.is_interwiki_prefix("De"));
        assert!(!f.is_interwiki_prefix("Category"));
        assert!(!f.is_interwiki_prefix("test"));
    }
}
