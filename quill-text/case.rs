use crate::Tendril;

pub fn to_upper_case(text: impl Iterator<Item = char>) -> Tendril {
  let mut res = Tendril::new();
  to_upper_case_with(text, &mut res);
  res
}

pub fn to_upper_case_with(text: impl Iterator<Item = char>, buf: &mut Tendril) {
  text.for_each(|c| buf.extend(c.to_uppercase()));
}

pub fn to_lower_case(text: impl Iterator<Item = char>) -> Tendril {
  let mut res = Tendril::new();
  to_lower_case_with(text, &mut res);
  res
}

pub fn to_lower_case_with(text: impl Iterator<Item = char>, buf: &mut Tendril) {
  text.for_each(|c| buf.extend(c.to_lowercase()));
}

pub fn to_title_case(text: impl Iterator<Item = char>) -> Tendril {
  let mut res = Tendril::new();
  to_title_case_with(text, &mut res);
  res
}

/// Upper-case the first character, lower-case the rest.
pub fn to_title_case_with(mut text: impl Iterator<Item = char>, buf: &mut Tendril) {
  if let Some(first) = text.next() {
    buf.extend(first.to_uppercase());
  }
  text.for_each(|c| buf.extend(c.to_lowercase()));
}
