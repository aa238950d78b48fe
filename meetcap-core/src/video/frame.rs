/// Pixel layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Bgr,
    Bgra,
}

/// One captured screen frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl VideoFrame {
    /// Convert to packed RGB, the layout the video writer expects.
    ///
    /// RGB input passes through unchanged.
    pub fn into_rgb(self) -> VideoFrame {
        match self.format {
            PixelFormat::Rgb => self,
            PixelFormat::Bgr => {
                let VideoFrame {
                    width,
                    height,
                    mut data,
                    ..
                } = self;
                for px in data.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                VideoFrame {
                    width,
                    height,
                    format: PixelFormat::Rgb,
                    data,
                }
            }
            PixelFormat::Bgra => {
                let mut data = Vec::with_capacity(self.data.len() / 4 * 3);
                for px in self.data.chunks_exact(4) {
                    data.extend_from_slice(&[px[2], px[1], px[0]]);
                }
                VideoFrame {
                    width: self.width,
                    height: self.height,
                    format: PixelFormat::Rgb,
                    data,
                }
            }
        }
    }
}
