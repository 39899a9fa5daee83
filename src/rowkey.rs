//! Row key assembly from configured key components.

use crate::schema::KeyComponent;
use rand::Rng;
use rand::distributions::Alphanumeric;

/// Produces the random tail appended to uniquified row keys.
///
/// The default [`RandomSuffix`] draws from the thread-local RNG; tests inject
/// a deterministic generator instead.
pub trait SuffixGenerator: Send {
    /// Fill `buf` entirely with suffix bytes.
    fn fill(&mut self, buf: &mut [u8]);
}

/// Alphanumeric suffix bytes.
#[derive(Copy, Clone, Debug, Default)]
pub struct RandomSuffix;

impl SuffixGenerator for RandomSuffix {
    fn fill(&mut self, buf: &mut [u8]) {
        let mut rng = rand::thread_rng();
        for slot in buf.iter_mut() {
            *slot = rng.sample(Alphanumeric);
        }
    }
}

/// Assemble the key components into `out`, joined by single spaces.
///
/// `value` maps a column index to its bytes for the current line; `None`
/// means the line has no usable value there, which fails the whole key.
/// Values shorter than a component's width are padded with its pad byte,
/// before the value by default or after it for left-justified components.
/// Longer values are kept whole.
///
/// Returns `false` when any component's value is missing; `out` is then in
/// an unspecified state and the line should be skipped.
pub fn build_row_key<'a, F>(components: &[KeyComponent], mut value: F, out: &mut Vec<u8>) -> bool
where
    F: FnMut(usize) -> Option<&'a [u8]>,
{
    out.clear();
    for (position, component) in components.iter().enumerate() {
        let Some(bytes) = value(component.column) else {
            return false;
        };
        if position > 0 {
            out.push(b' ');
        }
        let padding = component.width.saturating_sub(bytes.len());
        if component.left_justify {
            out.extend_from_slice(bytes);
            out.extend(std::iter::repeat_n(component.pad, padding));
        } else {
            out.extend(std::iter::repeat_n(component.pad, padding));
            out.extend_from_slice(bytes);
        }
    }
    true
}

/// Append a single space plus `count` generator-produced bytes to `key`.
pub fn append_suffix(generator: &mut dyn SuffixGenerator, count: usize, key: &mut Vec<u8>) {
    let start = key.len();
    key.push(b' ');
    key.resize(start + 1 + count, 0);
    generator.fill(&mut key[start + 1..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(column: usize, width: usize, pad: u8, left_justify: bool) -> KeyComponent {
        KeyComponent { column, width, pad, left_justify }
    }

    fn build(components: &[KeyComponent], values: &[Option<&str>]) -> Option<Vec<u8>> {
        let mut out = Vec::new();
        let ok = build_row_key(
            components,
            |column| values.get(column).copied().flatten().map(str::as_bytes),
            &mut out,
        );
        ok.then_some(out)
    }

    #[test]
    fn bare_component_is_verbatim() {
        let key = build(&[component(0, 0, b' ', false)], &[Some("42")]).unwrap();
        assert_eq!(key, b"42");
    }

    #[test]
    fn zero_pads_to_width() {
        let key = build(&[component(0, 5, b'0', false)], &[Some("42")]).unwrap();
        assert_eq!(key, b"00042");
    }

    #[test]
    fn left_justify_pads_after() {
        let key = build(&[component(0, 5, b' ', true)], &[Some("42")]).unwrap();
        assert_eq!(key, b"42   ");
    }

    #[test]
    fn long_values_are_not_truncated() {
        let key = build(&[component(0, 3, b'0', false)], &[Some("123456")]).unwrap();
        assert_eq!(key, b"123456");
    }

    #[test]
    fn components_join_with_single_spaces() {
        let components = [
            component(1, 4, b'0', false),
            component(0, 0, b' ', false),
        ];
        let key = build(&components, &[Some("us-east"), Some("7")]).unwrap();
        assert_eq!(key, b"0007 us-east");
    }

    #[test]
    fn missing_component_fails_the_key() {
        assert!(build(&[component(0, 0, b' ', false)], &[None]).is_none());
        assert!(build(&[component(2, 0, b' ', false)], &[Some("a")]).is_none());
    }

    struct Fixed(u8);

    impl SuffixGenerator for Fixed {
        fn fill(&mut self, buf: &mut [u8]) {
            buf.fill(self.0);
        }
    }

    #[test]
    fn suffix_appends_space_then_bytes() {
        let mut key = b"base".to_vec();
        append_suffix(&mut Fixed(b'x'), 3, &mut key);
        assert_eq!(key, b"base xxx");
    }
}
