//! Dense row-major arrays read from the archive.

use serde::{Deserialize, Serialize};

use super::traits::ArchiveError;

/// Dense, row-major `f32` tensor.
///
/// The leading dimension is always the frame axis, so `len()` is the episode
/// length `L` and `frame(t)` is the contiguous block for frame `t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArray")]
pub struct Array {
    shape: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Deserialize)]
struct RawArray {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl TryFrom<RawArray> for Array {
    type Error = ArchiveError;

    fn try_from(raw: RawArray) -> Result<Self, Self::Error> {
        Self::new(raw.shape, raw.data)
    }
}

impl Array {
    /// Creates an array, checking that `data` fills `shape` exactly.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::ShapeMismatch` if the element count disagrees with
    /// the shape, or if the shape is empty.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, ArchiveError> {
        let expected = shape.iter().product::<usize>();
        if shape.is_empty() || expected != data.len() {
            return Err(ArchiveError::ShapeMismatch {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Zero-filled array of the given shape.
    #[must_use]
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product::<usize>();
        Self {
            shape,
            data: vec![0.0; len],
        }
    }

    /// One-dimensional array (e.g. per-frame rewards).
    #[must_use]
    pub fn from_series(values: Vec<f32>) -> Self {
        Self {
            shape: vec![values.len()],
            data: values,
        }
    }

    /// Stacks equally sized frames into a `[L, ..frame_shape]` array.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::ShapeMismatch` if any frame has the wrong size.
    pub fn from_frames(frame_shape: &[usize], frames: &[Vec<f32>]) -> Result<Self, ArchiveError> {
        let frame_len = frame_shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(frame_len * frames.len());
        for frame in frames {
            if frame.len() != frame_len {
                return Err(ArchiveError::ShapeMismatch {
                    shape: frame_shape.to_vec(),
                    len: frame.len(),
                });
            }
            data.extend_from_slice(frame);
        }
        let mut shape = Vec::with_capacity(frame_shape.len() + 1);
        shape.push(frames.len());
        shape.extend_from_slice(frame_shape);
        Ok(Self { shape, data })
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of frames (leading dimension).
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of a single frame (everything after the leading dimension).
    #[must_use]
    pub fn frame_shape(&self) -> &[usize] {
        self.shape.get(1..).unwrap_or(&[])
    }

    /// Number of elements in one frame.
    #[must_use]
    pub fn frame_len(&self) -> usize {
        self.frame_shape().iter().product()
    }

    /// Contiguous data of frame `t`, or `None` past the end.
    #[must_use]
    pub fn frame(&self, t: usize) -> Option<&[f32]> {
        if t >= self.len() {
            return None;
        }
        let n = self.frame_len();
        self.data.get(t * n..(t + 1) * n)
    }

    /// Iterator over frames in order.
    pub fn frames(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.len()).filter_map(move |t| self.frame(t))
    }

    /// Copies frame `t` into a standalone `[1, ..frame_shape]` array.
    #[must_use]
    pub fn frame_array(&self, t: usize) -> Option<Self> {
        let frame = self.frame(t)?;
        let mut shape = vec![1];
        shape.extend_from_slice(self.frame_shape());
        Some(Self {
            shape,
            data: frame.to_vec(),
        })
    }

    /// Frame data widened to `f64`, one `Vec` per frame.
    #[must_use]
    pub fn rows_f64(&self) -> Vec<Vec<f64>> {
        self.frames()
            .map(|row| row.iter().map(|&v| f64::from(v)).collect())
            .collect()
    }

    /// Flat data widened to `f64` (for `[L]` series).
    #[must_use]
    pub fn series_f64(&self) -> Vec<f64> {
        self.data.iter().map(|&v| f64::from(v)).collect()
    }

    /// Stable content hash over shape and data.
    ///
    /// Two reads of the same archive key must produce the same fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.shape.len() as u64).to_le_bytes());
        for dim in &self.shape {
            hasher.update(&(*dim as u64).to_le_bytes());
        }
        for v in &self.data {
            hasher.update(&v.to_le_bytes());
        }
        *hasher.finalize().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_mismatched_data() {
        let err = Array::new(vec![2, 3], vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, ArchiveError::ShapeMismatch { len: 5, .. }));
    }

    #[test]
    fn test_frames_are_contiguous() {
        let a = Array::new(vec![3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a.frame_len(), 2);
        assert_eq!(a.frame(1), Some(&[3.0, 4.0][..]));
        assert_eq!(a.frame(3), None);
        assert_eq!(a.frames().count(), 3);
    }

    #[test]
    fn test_series_has_unit_frames() {
        let a = Array::from_series(vec![0.0, 1.0, 0.0]);
        assert_eq!(a.len(), 3);
        assert_eq!(a.frame_len(), 1);
        assert_eq!(a.series_f64(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_empty_episode_has_no_frames() {
        let a = Array::zeros(vec![0, 80, 80]);
        assert!(a.is_empty());
        assert_eq!(a.frames().count(), 0);
        assert!(a.rows_f64().is_empty());
    }

    #[test]
    fn test_zero_sized_frames_are_still_yielded() {
        let a = Array::zeros(vec![3, 4, 0]);
        assert_eq!(a.frame_len(), 0);
        let frames: Vec<&[f32]> = a.frames().collect();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.is_empty()));
    }

    #[test]
    fn test_frame_array_keeps_frame_shape() {
        let a = Array::from_frames(&[2, 2], &[vec![1.0; 4], vec![2.0; 4]]).unwrap();
        let f = a.frame_array(1).unwrap();
        assert_eq!(f.shape(), &[1, 2, 2]);
        assert!(f.data().iter().all(|&v| (v - 2.0).abs() < f32::EPSILON));
    }

    #[test]
    fn test_deserialize_validates_shape() {
        let ok: Array = serde_json::from_str(r#"{"shape":[2],"data":[1.0,2.0]}"#).unwrap();
        assert_eq!(ok.len(), 2);
        let bad = serde_json::from_str::<Array>(r#"{"shape":[3],"data":[1.0]}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_fingerprint_tracks_content_and_shape() {
        let a = Array::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Array::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let c = Array::new(vec![4, 1], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
