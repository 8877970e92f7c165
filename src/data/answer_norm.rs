// ============================================================
// Layer 4 — Answer Normalisation
// ============================================================
// Human answers are collected as free text ("Two", "dog's",
// "yes?"). Before a valid answer is looked up in the answer
// vocabulary it is normalised the same way the vocabulary was
// built:
//
//   1. lowercase
//   2. drop ',' and '?'
//   3. split the possessive: "dog's" → "dog 's"
//   4. trim the ends

pub fn word_tokenize(word: &str) -> String {
    word.to_lowercase()
        .replace([',', '?'], "")
        .replace("'s", " 's")
        .trim()
        .to_string()
}
