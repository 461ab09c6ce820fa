/// Create a sobel kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel, either 3 or 5.
///
/// # Returns
///
/// The derivative and smoothing 1d kernels, or `None` for an unsupported size.
pub fn sobel_kernel_1d(kernel_size: usize) -> Option<([f32; 5], [f32; 5], usize)> {
    match kernel_size {
        3 => Some(([-1.0, 0.0, 1.0, 0.0, 0.0], [1.0, 2.0, 1.0, 0.0, 0.0], 3)),
        5 => Some((
            [-1.0, -2.0, 0.0, 2.0, 1.0],
            [1.0, 4.0, 6.0, 4.0, 1.0],
            5,
        )),
        _ => None,
    }
}

/// Map an out-of-range coordinate back into `[0, len)` by mirroring around the
/// border pixel without repeating it (`gfedcb|abcdefgh|gfedcba`).
pub fn reflect_101(idx: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = idx;
    // kernels wider than the image need more than one bounce
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}
