mod framing;
